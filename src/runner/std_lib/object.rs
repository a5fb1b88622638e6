//! The root object type.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::TypeRegistry;
use crate::runner::plugin::types::NativeType;

pub const OBJECT_TYPE_NAME: &str = "Object";

pub fn register(registry: &mut TypeRegistry) {
    registry.register_type(NativeType::new(OBJECT_TYPE_NAME).with_constructor(object_constructor));
}

/// `new Object(value)` returns `value` when it is already an object, a fresh
/// ordinary object otherwise.
fn object_constructor(
    ctx: &EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match args.into_iter().next() {
        Some(value @ JsValue::Object(_)) => Ok(value),
        _ => Ok(JsValue::Object(ctx.new_object()?)),
    }
}
