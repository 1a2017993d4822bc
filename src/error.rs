// ABOUTME: Error types distinguishing user-facing failures from interpreter bugs

use crate::value::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Expected failure in user code: arity mismatches, type mismatches,
    /// syntax shape errors and the like.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Lookup of a name with no binding in any enclosing frame.
    #[error("Evaluation error: Undefined variable: {0}")]
    UndefinedVariable(String),

    /// Invariant violation that signals a bug in the interpreter itself.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EvalError {
    pub fn evaluation(msg: impl Into<String>) -> Self {
        EvalError::Evaluation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        EvalError::Internal(msg.into())
    }

    /// A type mismatch naming the offending value in inspect form.
    pub fn type_error(msg: &str, value: &Value) -> Self {
        EvalError::Evaluation(format!("{}: {}", msg, value))
    }
}

#[derive(Error, Debug, Clone)]
#[error("Parse error: {0}")]
pub struct ParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rendering() {
        let e = EvalError::evaluation("This function takes 2 arguments");
        assert_eq!(e.to_string(), "Evaluation error: This function takes 2 arguments");

        let e = EvalError::UndefinedVariable("x".to_string());
        assert_eq!(e.to_string(), "Evaluation error: Undefined variable: x");

        let e = EvalError::internal("Inconsistent stack");
        assert_eq!(e.to_string(), "Internal error: Inconsistent stack");
    }

    #[test]
    fn test_type_error_includes_value() {
        let e = EvalError::type_error("Not a cons", &Value::Num(1.0));
        assert_eq!(e.to_string(), "Evaluation error: Not a cons: 1");
    }

    #[test]
    fn test_parse_error_rendering() {
        let e = ParseError("unexpected end of input".to_string());
        assert_eq!(e.to_string(), "Parse error: unexpected end of input");
    }
}
