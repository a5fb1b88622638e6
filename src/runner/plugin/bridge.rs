//! The bridge root: one interception-enabled global context plus the state its
//! hook needs.

use std::any::Any;
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::heap::HeapConfig;
use crate::runner::ds::realm::{
    ClassDefinition, ContextLedger, ContextOptions, EvalContext, GlobalContext,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::augmenter::{PrototypeAugmenter, DEFAULT_MARKER_ATTRIBUTE};
use crate::runner::plugin::boxer::TypeBoxer;
use crate::runner::plugin::config::{BridgeConfig, BridgeError};
use crate::runner::plugin::members::{default_members, MemberBinding, MemberCatalog};
use crate::runner::plugin::resolver::{TypeLookup, TypeResolver, DEFAULT_IGNORED_NAMES};
use crate::runner::plugin::super_global::{intercept_global_get, BridgeState};

pub const GLOBAL_CLASS_NAME: &str = "MoccaccinoGlobal";

/// Exposes native types to scripts on first reference.
///
/// Scripts run through [`Bridge::evaluate`] (or through [`Bridge::context`])
/// see every resolvable native type as a global. Types that do not declare
/// their own script surface get the configured bridging members on their
/// prototype, installed once per prototype.
pub struct Bridge {
    // Dropped before `state`.
    context: GlobalContext,
    state: Rc<BridgeState>,
}

impl Bridge {
    /// Bridge with the default ignore set, marker and members.
    pub fn new<L: TypeLookup + 'static>(types: L) -> Bridge {
        BridgeBuilder::new().build(types)
    }

    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    pub fn evaluate(&self, code: &str) -> Result<JsValue, JErrorType> {
        self.context.evaluate_script(code)
    }

    pub fn marker(&self) -> &str {
        self.state.augmenter.marker()
    }

    pub fn members(&self) -> &[MemberBinding] {
        self.state.augmenter.members()
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.state.resolver.is_ignored(name)
    }

    /// How many times the named type's prototype has been augmented by this
    /// bridge. Stays at 1 however often the type is looked up.
    pub fn installation_count(&self, type_name: &str) -> usize {
        self.state.augmenter.installation_count(type_name)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Ok(global) = self.context.global_object() {
            global.borrow_mut().set_private(None);
        }
        debug!(target: "bridge", context = %self.context.context_id(), "bridge dropped");
    }
}

pub struct BridgeBuilder {
    marker: String,
    ignored: Vec<String>,
    members: Vec<MemberBinding>,
    heap: HeapConfig,
    ledger: Option<ContextLedger>,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        BridgeBuilder {
            marker: DEFAULT_MARKER_ATTRIBUTE.to_string(),
            ignored: DEFAULT_IGNORED_NAMES.iter().map(|s| s.to_string()).collect(),
            members: default_members(),
            heap: HeapConfig::unlimited(),
            ledger: None,
        }
    }
}

impl BridgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ignore set.
    pub fn with_ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Replaces the member set.
    pub fn with_members(mut self, members: Vec<MemberBinding>) -> Self {
        self.members = members;
        self
    }

    /// Adds a member, replacing one of the same name.
    pub fn with_member(mut self, member: MemberBinding) -> Self {
        self.members.retain(|m| m.name != member.name);
        self.members.push(member);
        self
    }

    pub fn with_heap_limit(mut self, max_bytes: usize) -> Self {
        self.heap = HeapConfig::with_limit(max_bytes);
        self
    }

    pub fn with_ledger(mut self, ledger: ContextLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Applies a configuration file's settings, resolving native members
    /// against `catalog`.
    pub fn with_config(
        mut self,
        config: &BridgeConfig,
        catalog: &MemberCatalog,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        self.members = config.member_bindings(catalog)?;
        self.marker = config.marker.clone();
        self.ignored = config.ignore.clone();
        if let Some(limit) = config.heap_limit {
            self.heap = HeapConfig::with_limit(limit);
        }
        Ok(self)
    }

    pub fn build<L: TypeLookup + 'static>(self, types: L) -> Bridge {
        let state = Rc::new(BridgeState {
            resolver: TypeResolver::new(Box::new(types), self.ignored),
            boxer: TypeBoxer::new(),
            augmenter: PrototypeAugmenter::new(self.marker, self.members),
        });
        let context = GlobalContext::create(
            Some(ClassDefinition::new(GLOBAL_CLASS_NAME).with_get_property(intercept_global_get)),
            ContextOptions {
                heap: self.heap,
                ledger: self.ledger,
            },
        );

        let back_reference: Weak<dyn Any> = Rc::downgrade(&state) as Weak<dyn Any>;
        if let Ok(global) = context.global_object() {
            global.borrow_mut().set_private(Some(back_reference));
        }
        info!(
            target: "bridge",
            context = %context.context_id(),
            marker = state.augmenter.marker(),
            members = state.augmenter.members().len(),
            "bridge ready"
        );
        Bridge { context, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::plugin::registry::TypeRegistry;
    use crate::runner::plugin::types::NativeType;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_core();
        registry.register_type(NativeType::new("Widget"));
        registry
    }

    #[test]
    fn test_global_carries_back_reference() {
        let bridge = Bridge::new(registry());
        let global = bridge.context().global_object().unwrap();
        assert!(global.borrow().get_private().is_some());
        assert_eq!(bridge.context().class_name(), GLOBAL_CLASS_NAME);
    }

    #[test]
    fn test_with_member_replaces_same_name() {
        let builder = Bridge::builder()
            .with_member(MemberBinding::value("test", JsValue::from("replaced")))
            .with_member(MemberBinding::value("extra", JsValue::Boolean(true)));
        let bridge = builder.build(registry());
        let names: Vec<&str> = bridge.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["test", "extra"]);
    }

    #[test]
    fn test_custom_marker_and_members() {
        let bridge = Bridge::builder()
            .with_marker("__done__")
            .with_members(vec![MemberBinding::value("answer", JsValue::Boolean(true))])
            .build(registry());
        assert_eq!(
            bridge.evaluate("new Widget().answer").unwrap(),
            JsValue::Boolean(true)
        );
        assert_eq!(
            bridge.evaluate("Widget.prototype.__done__").unwrap(),
            JsValue::Boolean(true)
        );
        assert_eq!(
            bridge.evaluate("typeof Widget.prototype.test").unwrap(),
            JsValue::from("undefined")
        );
    }

    #[test]
    fn test_with_config_applies_settings() {
        let config = BridgeConfig::parse(
            r#"
            marker = "__seen__"
            ignore = []
            [[members]]
            name = "describe"
            native = "describe"
            "#,
        )
        .unwrap();
        let bridge = Bridge::builder()
            .with_config(&config, &MemberCatalog::with_core())
            .unwrap()
            .build(registry());
        assert_eq!(bridge.marker(), "__seen__");
        assert!(!bridge.is_ignored("Object"));
        assert_eq!(
            bridge.evaluate("Widget.prototype.describe()").unwrap(),
            JsValue::from("[NativeType Widget]")
        );
    }
}
