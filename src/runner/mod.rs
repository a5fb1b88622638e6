//! Script engine and native type bridge.
//!
//! - **[`ds`]** - Data structures (values, objects, global contexts)
//! - **[`eval`]** - Tree-walking evaluator
//! - **[`plugin`]** - Lazy exposure of native types through the global hook
//! - **[`std_lib`]** - Core native types (`Object`, `console`)

pub mod ds;
pub mod eval;
pub mod plugin;
pub mod std_lib;
