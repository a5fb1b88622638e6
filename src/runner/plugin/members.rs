//! Bridging members installed on augmented prototypes.

use std::collections::HashMap;

use tracing::info;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{BuiltInFn, NativeFn};
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;

/// Where the value of a bridging member comes from.
#[derive(Debug, Clone)]
pub enum MemberSource {
    /// A callable, wrapped into a fresh function object per prototype.
    Native(BuiltInFn),
    /// Another global name, resolved through the engine at install time.
    /// Resolving it can re-enter the bridge, including for the very type that
    /// is being augmented.
    Alias(String),
    Value(JsValue),
}

#[derive(Debug, Clone)]
pub struct MemberBinding {
    pub name: String,
    pub source: MemberSource,
}

impl MemberBinding {
    pub fn native(name: impl Into<String>, behavior: BuiltInFn) -> Self {
        MemberBinding {
            name: name.into(),
            source: MemberSource::Native(behavior),
        }
    }

    pub fn alias(name: impl Into<String>, target: impl Into<String>) -> Self {
        MemberBinding {
            name: name.into(),
            source: MemberSource::Alias(target.into()),
        }
    }

    pub fn value(name: impl Into<String>, value: JsValue) -> Self {
        MemberBinding {
            name: name.into(),
            source: MemberSource::Value(value),
        }
    }
}

/// Members installed when no configuration says otherwise: the `test` demo method.
pub fn default_members() -> Vec<MemberBinding> {
    vec![MemberBinding::native("test", BuiltInFn::Native(member_test))]
}

/// Named callables that configuration files can refer to.
#[derive(Default)]
pub struct MemberCatalog {
    entries: HashMap<String, BuiltInFn>,
}

impl MemberCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with `test` and `describe`.
    pub fn with_core() -> Self {
        let mut catalog = Self::new();
        catalog.register("test", member_test);
        catalog.register("describe", member_describe);
        catalog
    }

    pub fn register(&mut self, name: impl Into<String>, func: NativeFn) {
        self.entries.insert(name.into(), BuiltInFn::Native(func));
    }

    pub fn register_closure<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    {
        self.entries.insert(name.into(), BuiltInFn::from_closure(f));
    }

    pub fn get(&self, name: &str) -> Option<&BuiltInFn> {
        self.entries.get(name)
    }
}

/// The demo bridging method: logs the receiver's type.
fn member_test(ctx: &EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let type_name = ctx.native_type_name(&this).unwrap_or_default();
    info!(target: "bridge", type_name = %type_name, "test() called");
    Ok(JsValue::Undefined)
}

/// `"[NativeType <name>]"` for a class value, its prototype, or an instance.
fn member_describe(
    ctx: &EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match ctx.native_type_name(&this) {
        Some(name) => Ok(JsValue::String(format!("[NativeType {}]", name))),
        None => Err(JErrorType::TypeError(format!(
            "describe called on {}, which is not a native type",
            this
        ))),
    }
}
