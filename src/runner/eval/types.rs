//! Core types for the evaluation engine.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

/// Completion record.
/// Every statement evaluation returns a completion record; only normal
/// completions exist in this language, so the record carries just a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The value, if any. Declarations and empty statements have none.
    pub value: Option<JsValue>,
}

impl Completion {
    /// Create a normal completion with no value.
    pub fn normal() -> Self {
        Completion { value: None }
    }

    /// Create a normal completion with a value.
    pub fn normal_with_value(value: JsValue) -> Self {
        Completion { value: Some(value) }
    }
}

pub type EvalResult = Result<Completion, JErrorType>;
pub type ValueResult = Result<JsValue, JErrorType>;
