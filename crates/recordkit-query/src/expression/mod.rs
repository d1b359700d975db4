//! Formula expression evaluation.
//!
//! Computed fields and conditional rules are written as formulas, parsed
//! elsewhere into an [`ExpressionNode`] tree, and evaluated here against the
//! current form values and a handful of system values (`NOW`, `TODAY`,
//! `CURRENT_USER`).
//!
//! # Example
//!
//! ```
//! use recordkit_query::expression::{evaluate, EvaluationContext, ExpressionNode, SystemValueProvider, Value};
//! use serde_json::json;
//!
//! let expr: ExpressionNode = serde_json::from_value(json!({
//!     "type": "CallExpression",
//!     "callee": "UPPER",
//!     "args": [{ "type": "Identifier", "name": "code" }]
//! }))
//! .unwrap();
//!
//! let context = EvaluationContext::capture(json!({ "code": "ab-1" }), &SystemValueProvider::default());
//! assert_eq!(evaluate(&expr, &context), Ok(Value::from("AB-1")));
//! ```

mod ast;
mod error;
mod evaluator;
mod functions;
mod operators;
mod system;
mod value;

pub use ast::{ExpressionNode, NodeKind, Property};
pub use error::{EvalResult, EvaluationError};
pub use evaluator::{evaluate, Evaluator, EvaluatorOptions, LogicalMode, DEFAULT_MAX_DEPTH};
pub use functions::{FunctionRegistry, NativeFunction};
pub use operators::{loose_eq, BinaryOperator, LogicalOp};
pub use system::{EvaluationContext, SystemValueProvider, SystemValues, CURRENT_USER, NOW, TODAY};
pub use value::Value;
