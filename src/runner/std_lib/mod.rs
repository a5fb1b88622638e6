//! Native types every host gets.
//!
//! `Object` is the root object type and is on the default ignore list;
//! `console` declares its own script surface and is never augmented.

pub mod console;
pub mod core;
pub mod object;

pub use self::core::register_core_types;
