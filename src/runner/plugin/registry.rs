//! Registry of native types, looked up by exact name.

use std::collections::HashMap;
use std::rc::Rc;

use super::resolver::TypeLookup;
use super::types::{NativeType, NativeTypeRef};
use crate::runner::std_lib::register_core_types;

/// Registry for native types.
///
/// Registering a type under an existing name replaces the previous
/// descriptor; contexts that already boxed the old one box the new one on
/// their next lookup.
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, NativeTypeRef>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the core types (`Object`, `console`).
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_types(&mut registry);
        registry
    }

    pub fn register_type(&mut self, ty: NativeType) -> NativeTypeRef {
        let ty = Rc::new(ty);
        self.types.insert(ty.name().to_string(), ty.clone());
        ty
    }

    pub fn unregister_type(&mut self, name: &str) -> Option<NativeTypeRef> {
        self.types.remove(name)
    }

    pub fn get_type(&self, name: &str) -> Option<NativeTypeRef> {
        self.types.get(name).cloned()
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl TypeLookup for TypeRegistry {
    fn lookup_type(&self, name: &str) -> Option<NativeTypeRef> {
        self.get_type(name)
    }
}
