//! Name → native type resolution.
//!
//! The resolver is the first step of every intercepted global lookup. A miss
//! is the normal outcome for most names and is never an error.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use crate::runner::plugin::types::NativeTypeRef;

lazy_static! {
    /// Names that are never resolved unless a configuration says otherwise.
    /// `Object` is the root object type: exposing it would shadow the engine's
    /// own object model with a native wrapper.
    pub static ref DEFAULT_IGNORED_NAMES: Vec<&'static str> = vec!["Object"];
}

/// Source of native type descriptors.
pub trait TypeLookup {
    /// The type registered under exactly `name`, if any.
    fn lookup_type(&self, name: &str) -> Option<NativeTypeRef>;
}

impl<T: TypeLookup + ?Sized> TypeLookup for RefCell<T> {
    fn lookup_type(&self, name: &str) -> Option<NativeTypeRef> {
        self.borrow().lookup_type(name)
    }
}

impl<T: TypeLookup + ?Sized> TypeLookup for Rc<T> {
    fn lookup_type(&self, name: &str) -> Option<NativeTypeRef> {
        (**self).lookup_type(name)
    }
}

pub struct TypeResolver {
    lookup: Box<dyn TypeLookup>,
    ignored: HashSet<String>,
}

impl TypeResolver {
    pub fn new(lookup: Box<dyn TypeLookup>, ignored: impl IntoIterator<Item = String>) -> Self {
        TypeResolver {
            lookup,
            ignored: ignored.into_iter().collect(),
        }
    }

    /// Ignore-set membership is checked before the registry is consulted.
    pub fn resolve(&self, name: &str) -> Option<NativeTypeRef> {
        if self.ignored.contains(name) {
            trace!(target: "bridge", name, "ignored name");
            return None;
        }
        let found = self.lookup.lookup_type(name);
        if found.is_none() {
            trace!(target: "bridge", name, "no native type");
        }
        found
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }
}
