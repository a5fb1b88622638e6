use std::fmt;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::realm::EvalContext;
use crate::runner::ds::value::JsValue;

/// Function signature for native methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn =
    fn(ctx: &EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// Native function - either a plain function pointer or a host closure.
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer - zero overhead for compiled-in functions.
    Native(NativeFn),

    /// Host-provided closure, shared between every object it is installed on.
    Plugin(Rc<dyn Fn(&EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>>),
}

impl BuiltInFn {
    pub fn from_closure<F>(f: F) -> Self
    where
        F: Fn(&EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    {
        BuiltInFn::Plugin(Rc::new(f))
    }

    pub fn call(
        &self,
        ctx: &EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

impl fmt::Debug for BuiltInFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltInFn::Native(_) => write!(f, "BuiltInFn::Native"),
            BuiltInFn::Plugin(_) => write!(f, "BuiltInFn::Plugin"),
        }
    }
}

/// Callable object payload.
pub struct FunctionObject {
    pub name: String,
    pub behavior: BuiltInFn,
}

impl FunctionObject {
    pub fn new(name: impl Into<String>, behavior: BuiltInFn) -> Self {
        FunctionObject {
            name: name.into(),
            behavior,
        }
    }
}
