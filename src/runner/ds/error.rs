use thiserror::Error;

/// An exception raised by the engine. Script code observes these as thrown
/// errors; native callbacks report them through their exception out-slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JErrorType {
    #[error("Uncaught reference error: {0}.")]
    ReferenceError(String),
    #[error("Uncaught type error: {0}.")]
    TypeError(String),
    #[error("Uncaught range error: {0}.")]
    RangeError(String),
    #[error("Uncaught syntax error: {0}.")]
    SyntaxError(String),
}

impl JErrorType {
    pub fn message(&self) -> &str {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JErrorType::TypeError("Widget is not a function".to_string());
        assert_eq!(err.to_string(), "Uncaught type error: Widget is not a function.");
        assert_eq!(err.message(), "Widget is not a function");
    }
}
