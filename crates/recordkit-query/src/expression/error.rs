//! Error types for expression evaluation.

use thiserror::Error;

/// A specialized Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating an expression tree.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    /// The node's `type` is not one the evaluator understands.
    #[error("unsupported expression type: {node_type}")]
    UnsupportedExpression {
        /// The unrecognized node type.
        node_type: String,
    },

    /// A binary or logical node carries an operator that is not recognized.
    #[error("unsupported {expression} operator: {operator}")]
    UnsupportedOperator {
        /// The node type that carried the operator.
        expression: &'static str,
        /// The unrecognized operator.
        operator: String,
    },

    /// A node has the wrong number of arguments.
    #[error("{expression} requires {expected}")]
    Arity {
        /// The node type.
        expression: &'static str,
        /// Human-readable argument count, e.g. "2 arguments".
        expected: &'static str,
    },

    /// A call node has no function name.
    #[error("CallExpression requires a callee")]
    MissingCallee,

    /// A call names a function that is not registered.
    #[error("unknown function: {name}{hint}", hint = suggestion_hint(.suggestion))]
    UnknownFunction {
        /// The requested name.
        name: String,
        /// Closest registered name, if one is near enough.
        suggestion: Option<String>,
    },

    /// The expression tree is nested deeper than the evaluator allows.
    #[error("expression nesting exceeds maximum depth of {limit}")]
    DepthLimitExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// A registered function rejected its arguments.
    #[error("{name}: {message}")]
    Function {
        /// The function that failed.
        name: String,
        /// Why it failed.
        message: String,
    },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean {}?)", name),
        None => String::new(),
    }
}

impl EvaluationError {
    /// Creates an unsupported expression error.
    pub fn unsupported_expression(node_type: impl Into<String>) -> Self {
        EvaluationError::UnsupportedExpression {
            node_type: node_type.into(),
        }
    }

    /// Creates an unsupported operator error.
    pub fn unsupported_operator(expression: &'static str, operator: impl Into<String>) -> Self {
        EvaluationError::UnsupportedOperator {
            expression,
            operator: operator.into(),
        }
    }

    /// Creates an arity error.
    pub fn arity(expression: &'static str, expected: &'static str) -> Self {
        EvaluationError::Arity { expression, expected }
    }

    /// Creates a function failure.
    pub fn function(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvaluationError::Function {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns a short machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            EvaluationError::UnsupportedExpression { .. } => "unsupported_expression",
            EvaluationError::UnsupportedOperator { .. } => "unsupported_operator",
            EvaluationError::Arity { .. } => "arity",
            EvaluationError::MissingCallee => "missing_callee",
            EvaluationError::UnknownFunction { .. } => "unknown_function",
            EvaluationError::DepthLimitExceeded { .. } => "depth_limit",
            EvaluationError::Function { .. } => "function_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message() {
        let err = EvaluationError::arity("BinaryExpression", "2 arguments");
        assert_eq!(err.to_string(), "BinaryExpression requires 2 arguments");
    }

    #[test]
    fn test_unknown_function_message() {
        let plain = EvaluationError::UnknownFunction {
            name: "FOO".to_string(),
            suggestion: None,
        };
        assert_eq!(plain.to_string(), "unknown function: FOO");

        let hinted = EvaluationError::UnknownFunction {
            name: "UPPPER".to_string(),
            suggestion: Some("UPPER".to_string()),
        };
        assert_eq!(hinted.to_string(), "unknown function: UPPPER (did you mean UPPER?)");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            EvaluationError::unsupported_expression("X"),
            EvaluationError::unsupported_operator("BinaryExpression", "**"),
            EvaluationError::arity("MemberExpression", "1 argument"),
            EvaluationError::MissingCallee,
            EvaluationError::UnknownFunction {
                name: "X".to_string(),
                suggestion: None,
            },
            EvaluationError::DepthLimitExceeded { limit: 1 },
            EvaluationError::function("LEFT", "bad"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
