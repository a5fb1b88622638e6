//! One-time augmentation of native type prototypes.
//!
//! The marker is a sentinel own property of the prototype. It is written
//! before any member so that a lookup re-entering the bridge while members
//! are being installed sees the prototype as done and leaves it alone.
//!
//! If installing a member fails, every property the attempt wrote, the marker
//! included, is put back the way it was (or removed when it did not exist)
//! before the error is reported. The next lookup of the type therefore retries
//! the whole augmentation; a prototype is never left marked but incomplete.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyAttributes, PropertyDescriptor};
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::members::{MemberBinding, MemberSource};
use crate::runner::plugin::types::NativeType;

pub const DEFAULT_MARKER_ATTRIBUTE: &str = "__moccaccino_bridged__";

/// The marker stays configurable so a failed attempt can be rolled back.
pub const MARKER_ATTRIBUTES: PropertyAttributes =
    PropertyAttributes::READ_ONLY.union(PropertyAttributes::DONT_ENUM);

pub const MEMBER_ATTRIBUTES: PropertyAttributes = PropertyAttributes::DONT_ENUM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    /// The type declares its own script surface.
    OptedOut,
    AlreadyAugmented,
    Installed,
}

pub struct PrototypeAugmenter {
    marker: String,
    members: Vec<MemberBinding>,
    installations: RefCell<HashMap<String, usize>>,
}

impl PrototypeAugmenter {
    pub fn new(marker: impl Into<String>, members: Vec<MemberBinding>) -> Self {
        PrototypeAugmenter {
            marker: marker.into(),
            members,
            installations: RefCell::new(HashMap::new()),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn members(&self) -> &[MemberBinding] {
        &self.members
    }

    /// Completed member installations for the named type, across all contexts
    /// this augmenter served.
    pub fn installation_count(&self, type_name: &str) -> usize {
        self.installations
            .borrow()
            .get(type_name)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_marked(&self, prototype: &JsObjectType) -> bool {
        prototype
            .borrow()
            .get_own_property(&self.marker)
            .map(|desc| desc.value.is_truthy())
            .unwrap_or(false)
    }

    pub fn ensure_augmented(
        &self,
        ctx: &EvalContext,
        prototype: &JsObjectType,
        ty: &NativeType,
    ) -> Result<Augmentation, JErrorType> {
        if ty.declares_script_surface() {
            return Ok(Augmentation::OptedOut);
        }
        if self.is_marked(prototype) {
            return Ok(Augmentation::AlreadyAugmented);
        }

        let mut overwritten: Vec<(&str, Option<PropertyDescriptor>)> =
            Vec::with_capacity(self.members.len() + 1);
        overwritten.push((self.marker.as_str(), own_property(prototype, &self.marker)));
        ctx.define_property(prototype, &self.marker, JsValue::Boolean(true), MARKER_ATTRIBUTES)
            .map_err(|e| {
                warn!(target: "bridge", type_name = ty.name(), "cannot mark prototype: {}", e);
                e
            })?;

        for binding in &self.members {
            let previous = own_property(prototype, &binding.name);
            if let Err(e) = self.install_member(ctx, prototype, binding) {
                warn!(
                    target: "bridge",
                    type_name = ty.name(),
                    member = %binding.name,
                    "augmentation failed, rolling back: {}",
                    e
                );
                restore(ctx, prototype, overwritten);
                return Err(e);
            }
            overwritten.push((binding.name.as_str(), previous));
        }

        *self
            .installations
            .borrow_mut()
            .entry(ty.name().to_string())
            .or_insert(0) += 1;
        debug!(
            target: "bridge",
            type_name = ty.name(),
            members = self.members.len(),
            "prototype augmented"
        );
        Ok(Augmentation::Installed)
    }

    fn install_member(
        &self,
        ctx: &EvalContext,
        prototype: &JsObjectType,
        binding: &MemberBinding,
    ) -> Result<(), JErrorType> {
        let value = match &binding.source {
            MemberSource::Native(behavior) => ctx.new_function(&binding.name, behavior.clone())?,
            MemberSource::Alias(target) => ctx.get_global(target)?,
            MemberSource::Value(value) => value.clone(),
        };
        ctx.define_property(prototype, &binding.name, value, MEMBER_ATTRIBUTES)
    }
}

fn own_property(object: &JsObjectType, name: &str) -> Option<PropertyDescriptor> {
    object.borrow().get_own_property(name).cloned()
}

/// Undoes writes newest first, so a name written twice ends at its first state.
fn restore(
    ctx: &EvalContext,
    prototype: &JsObjectType,
    overwritten: Vec<(&str, Option<PropertyDescriptor>)>,
) {
    for (name, previous) in overwritten.into_iter().rev() {
        match previous {
            Some(desc) => {
                prototype.borrow_mut().define_own_property(name, desc);
            }
            None => {
                ctx.delete_property(prototype, name);
            }
        }
    }
}
