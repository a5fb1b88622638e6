//! # moccaccino - lazy native-type bridge for an embedded script engine
//!
//! Native types registered with the host become script globals the first
//! time a script names them, with no preloading:
//! - A small script engine: pest grammar, AST, tree-walking evaluator
//! - Global contexts whose global object accepts a `get_property` hook
//! - A bridge that resolves, boxes and augments native types from that hook
//!
//! ## Quick Start
//!
//! ```
//! use moccaccino::runner::plugin::{Bridge, NativeType, TypeRegistry};
//! use moccaccino::runner::ds::value::JsValue;
//!
//! let mut registry = TypeRegistry::with_core();
//! registry.register_type(NativeType::new("Widget"));
//! registry.register_type(NativeType::new("Gadget"));
//!
//! let bridge = Bridge::new(registry);
//! bridge.evaluate("new Widget().test(); new Gadget().test();").unwrap();
//!
//! // `Object` is ignored, so the engine's own lookup answers.
//! assert_eq!(bridge.evaluate("typeof Object").unwrap(), JsValue::from("undefined"));
//! // Unknown names are not errors.
//! assert_eq!(bridge.evaluate("typeof Nope").unwrap(), JsValue::from("undefined"));
//! ```
//!
//! ## Augmentation
//!
//! A type that does not declare its own script surface gets the bridge's
//! members (by default a single `test` method) on its prototype. A read-only,
//! non-enumerable marker property records that this happened, so repeated
//! lookups never install twice:
//!
//! ```
//! use moccaccino::runner::plugin::{Bridge, NativeType, TypeRegistry};
//! use moccaccino::runner::ds::value::JsValue;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_type(NativeType::new("Widget"));
//! let bridge = Bridge::new(registry);
//!
//! bridge.evaluate("Widget; Widget; Widget").unwrap();
//! assert_eq!(bridge.installation_count("Widget"), 1);
//! assert_eq!(
//!     bridge.evaluate("Widget.prototype.__moccaccino_bridged__").unwrap(),
//!     JsValue::Boolean(true)
//! );
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - Engine and bridge
//!   - **[`runner::ds`]** - Data structures (values, objects, global contexts)
//!   - **[`runner::eval`]** - Tree-walking interpreter
//!   - **[`runner::plugin`]** - Resolver, boxer, augmenter, bridge, config
//!   - **[`runner::std_lib`]** - Core native types

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
