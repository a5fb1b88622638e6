use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::object::{JsObjectType, ObjectKind};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Number(JsNumberType),
    Object(JsObjectType),
}

impl JsValue {
    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    /// ToBoolean.
    pub fn is_truthy(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::String(s) => !s.is_empty(),
            JsValue::Number(JsNumberType::Integer(i)) => *i != 0,
            JsValue::Number(JsNumberType::Float(f)) => *f != 0.0 && !f.is_nan(),
            JsValue::Object(_) => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => TYPE_STR_UNDEFINED,
            JsValue::Null => TYPE_STR_OBJECT,
            JsValue::Boolean(_) => "boolean",
            JsValue::String(_) => "string",
            JsValue::Number(_) => "number",
            JsValue::Object(o) => {
                if o.borrow().is_callable() {
                    TYPE_STR_FUNCTION
                } else {
                    TYPE_STR_OBJECT
                }
            }
        }
    }

    /// Abstract equality, restricted to what the script language can express.
    pub fn loosely_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Null) | (JsValue::Null, JsValue::Undefined) => true,
            _ => self == other,
        }
    }
}

impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            JsValue::Null => write!(f, "{}", TYPE_STR_NULL),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::String(s) => write!(f, "{}", s),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::Object(o) => match o.borrow().kind() {
                ObjectKind::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name),
                ObjectKind::Class(ty) => write!(f, "class {} {{ [native code] }}", ty.name()),
                ObjectKind::Prototype(name) => write!(f, "[object {}Prototype]", name),
                ObjectKind::Instance(ty) => write!(f, "[object {}]", ty.name()),
                ObjectKind::Global => write!(f, "[object GlobalObject]"),
                ObjectKind::Ordinary => write!(f, "[object Object]"),
            },
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({:?})", n),
            JsValue::Object(_) => write!(f, "JsValue::Object({})", self),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(s.to_string())
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum JsNumberType {
    Integer(i64),
    Float(f64),
}

impl JsNumberType {
    pub fn as_f64(&self) -> f64 {
        match self {
            JsNumberType::Integer(i) => *i as f64,
            JsNumberType::Float(f) => *f,
        }
    }
}

impl PartialEq for JsNumberType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsNumberType::Integer(a), JsNumberType::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl Display for JsNumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsNumberType::Integer(i) => write!(f, "{}", i),
            JsNumberType::Float(nf) => write!(f, "{}", nf),
        }
    }
}
