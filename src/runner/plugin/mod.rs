//! Lazy exposure of native types to scripts.
//!
//! A [`Bridge`] owns one global context whose class definition carries a
//! `get_property` hook. Nothing is preloaded: a native type becomes visible
//! the first time a script names it.
//!
//! ```text
//! Global lookup order (bridge context):
//! 1. Own property of the global object
//! 2. Bridge hook                 ← native types live here
//! 3. Global object's prototype chain
//! 4. undefined
//! ```
//!
//! ### Key Components
//!
//! - **[`TypeResolver`]**: name → native type, with an ignore set (`Object` by default)
//! - **[`TypeBoxer`]**: native type → class value, through the engine's wrapper cache
//! - **[`PrototypeAugmenter`]**: installs bridging members once per prototype,
//!   guarded by a read-only marker property
//! - **[`TypeRegistry`]**: the usual [`TypeLookup`] implementation
//! - **[`BridgeConfig`]**: marker, ignore set, heap limit and members from TOML
//!
//! Types that declare their own script surface (see
//! [`NativeType::exports_script_surface`]) are boxed but never augmented.
//!
//! ## Example
//!
//! ```
//! use moccaccino::runner::plugin::{Bridge, NativeType, TypeRegistry};
//! use moccaccino::runner::ds::value::JsValue;
//!
//! let mut registry = TypeRegistry::with_core();
//! registry.register_type(NativeType::new("Widget"));
//!
//! let bridge = Bridge::new(registry);
//! let kind = bridge.evaluate("typeof new Widget().test").unwrap();
//! assert_eq!(kind, JsValue::from("function"));
//! assert_eq!(bridge.installation_count("Widget"), 1);
//! ```

pub mod augmenter;
pub mod boxer;
pub mod bridge;
pub mod config;
pub mod members;
pub mod registry;
pub mod resolver;
pub mod super_global;
pub mod types;

pub use augmenter::{Augmentation, PrototypeAugmenter, DEFAULT_MARKER_ATTRIBUTE};
pub use boxer::TypeBoxer;
pub use bridge::{Bridge, BridgeBuilder};
pub use config::{BridgeConfig, BridgeError, MemberConfig};
pub use members::{default_members, MemberBinding, MemberCatalog, MemberSource};
pub use registry::TypeRegistry;
pub use resolver::{TypeLookup, TypeResolver, DEFAULT_IGNORED_NAMES};
pub use types::{NativeType, NativeTypeRef};
