//! Core native types registration.

use crate::runner::plugin::registry::TypeRegistry;

use super::console;
use super::object;

/// Register all core native types with the registry.
pub fn register_core_types(registry: &mut TypeRegistry) {
    object::register(registry);
    console::register(registry);
}
