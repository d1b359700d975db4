//! Recursive evaluation of expression trees.
//!
//! # Example
//!
//! ```
//! use recordkit_query::expression::{EvaluationContext, Evaluator, ExpressionNode, FunctionRegistry, Value};
//!
//! let registry = FunctionRegistry::builtin();
//! let evaluator = Evaluator::new(&registry);
//!
//! let mut context = EvaluationContext::default();
//! context.set_form_value("amount", 1200);
//!
//! let expr = ExpressionNode::binary(">", ExpressionNode::identifier("amount"), ExpressionNode::literal(1000));
//! assert_eq!(evaluator.evaluate(&expr, &context), Ok(Value::Bool(true)));
//! ```

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::ast::{ExpressionNode, NodeKind};
use super::error::{EvalResult, EvaluationError};
use super::functions::FunctionRegistry;
use super::operators::{BinaryOperator, LogicalOp};
use super::system::EvaluationContext;
use super::value::Value;

/// Default bound on expression nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How `AND` and `OR` treat their arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalMode {
    /// Every argument is evaluated before combining, so an error in any
    /// argument fails the whole expression.
    #[default]
    Eager,
    /// Evaluation stops at the first argument that decides the result.
    ShortCircuit,
}

impl std::str::FromStr for LogicalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eager" => Ok(LogicalMode::Eager),
            "short-circuit" => Ok(LogicalMode::ShortCircuit),
            other => Err(format!("unknown logical mode '{}' (expected eager or short-circuit)", other)),
        }
    }
}

impl std::fmt::Display for LogicalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalMode::Eager => write!(f, "eager"),
            LogicalMode::ShortCircuit => write!(f, "short-circuit"),
        }
    }
}

/// Evaluator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorOptions {
    /// Deepest nesting accepted before failing with
    /// [`EvaluationError::DepthLimitExceeded`].
    pub max_depth: usize,
    pub logical_mode: LogicalMode,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            logical_mode: LogicalMode::Eager,
        }
    }
}

/// Evaluates expression trees against an [`EvaluationContext`].
///
/// Evaluation is pure: the context is only read, and the same tree and
/// context always produce the same result.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r FunctionRegistry,
    options: EvaluatorOptions,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self::with_options(registry, EvaluatorOptions::default())
    }

    pub fn with_options(registry: &'r FunctionRegistry, options: EvaluatorOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> EvaluatorOptions {
        self.options
    }

    pub fn registry(&self) -> &'r FunctionRegistry {
        self.registry
    }

    /// Evaluates `node` and returns its value.
    pub fn evaluate(&self, node: &ExpressionNode, context: &EvaluationContext) -> EvalResult<Value> {
        self.eval(node, context, 0)
    }

    fn eval(&self, node: &ExpressionNode, context: &EvaluationContext, depth: usize) -> EvalResult<Value> {
        if depth > self.options.max_depth {
            warn!(limit = self.options.max_depth, "expression nesting limit exceeded");
            return Err(EvaluationError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }

        match &node.kind {
            NodeKind::Literal { value } => Ok(value.clone()),

            NodeKind::Identifier { name } => Ok(context.form_value(name).cloned().unwrap_or_default()),

            NodeKind::SystemIdentifier { name } => {
                let value = context.system_value(name).cloned().unwrap_or_default();
                match &node.property {
                    Some(property) => Ok(read_property(value, &property.name)),
                    None => Ok(value),
                }
            }

            NodeKind::Binary { operator, args } => {
                let op = BinaryOperator::parse(operator)
                    .ok_or_else(|| EvaluationError::unsupported_operator("BinaryExpression", operator))?;
                let [left, right] = args.as_slice() else {
                    return Err(EvaluationError::arity("BinaryExpression", "2 arguments"));
                };
                let left = self.eval(left, context, depth + 1)?;
                let right = self.eval(right, context, depth + 1)?;
                Ok(op.apply(&left, &right))
            }

            NodeKind::Logical { operator, args } => {
                let op = LogicalOp::parse(operator)
                    .ok_or_else(|| EvaluationError::unsupported_operator("LogicalExpression", operator))?;
                if args.is_empty() {
                    return Err(EvaluationError::arity("LogicalExpression", "at least 1 argument"));
                }
                self.eval_logical(op, args, context, depth)
            }

            NodeKind::Call { callee, args } => {
                let name = callee.as_deref().ok_or(EvaluationError::MissingCallee)?;
                let function = self.registry.get(name).ok_or_else(|| self.registry.unknown(name))?;
                let values = self.eval_all(args, context, depth)?;
                trace!(function = name, args = values.len(), "calling function");
                function(&values)
            }

            NodeKind::Member { args } => {
                let object = args
                    .first()
                    .ok_or(EvaluationError::arity("MemberExpression", "1 argument"))?;
                let base = self.eval(object, context, depth + 1)?;
                match &object.property {
                    Some(property) => Ok(read_property(base, &property.name)),
                    None => Ok(read_missing_property(base)),
                }
            }

            // The caller stores the result; anything but a single argument
            // has no value to store.
            NodeKind::Assignment { args } => match args.as_slice() {
                [only] => self.eval(only, context, depth + 1),
                _ => Ok(Value::Undefined),
            },

            NodeKind::Unsupported { node_type } => Err(EvaluationError::unsupported_expression(node_type.as_str())),
        }
    }

    fn eval_all(&self, args: &[ExpressionNode], context: &EvaluationContext, depth: usize) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, context, depth + 1)).collect()
    }

    fn eval_logical(
        &self,
        op: LogicalOp,
        args: &[ExpressionNode],
        context: &EvaluationContext,
        depth: usize,
    ) -> EvalResult<Value> {
        if self.options.logical_mode == LogicalMode::Eager {
            let values = self.eval_all(args, context, depth)?;
            let result = match op {
                LogicalOp::And => values.iter().all(Value::truthy),
                LogicalOp::Or => values.iter().any(Value::truthy),
                LogicalOp::Not => !values[0].truthy(),
            };
            return Ok(Value::Bool(result));
        }

        let result = match op {
            LogicalOp::Not => !self.eval(&args[0], context, depth + 1)?.truthy(),
            LogicalOp::And => {
                let mut all = true;
                for arg in args {
                    if !self.eval(arg, context, depth + 1)?.truthy() {
                        all = false;
                        break;
                    }
                }
                all
            }
            LogicalOp::Or => {
                let mut any = false;
                for arg in args {
                    if self.eval(arg, context, depth + 1)?.truthy() {
                        any = true;
                        break;
                    }
                }
                any
            }
        };
        Ok(Value::Bool(result))
    }
}

/// Property access: object-like bases yield the property, primitives pass
/// through unchanged.
fn read_property(base: Value, name: &str) -> Value {
    match base.property(name) {
        Some(value) => value,
        None => base,
    }
}

/// Member access without a property name.
fn read_missing_property(base: Value) -> Value {
    if base.is_object_like() {
        Value::Undefined
    } else {
        base
    }
}

/// Evaluates `node` with the built-in functions and default options.
pub fn evaluate(node: &ExpressionNode, context: &EvaluationContext) -> EvalResult<Value> {
    static BUILTINS: OnceLock<FunctionRegistry> = OnceLock::new();
    let registry = BUILTINS.get_or_init(FunctionRegistry::builtin);
    Evaluator::new(registry).evaluate(node, context)
}
