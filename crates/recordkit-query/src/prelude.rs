//! Prelude module for convenient imports.
//!
//! ```
//! use recordkit_query::prelude::*;
//!
//! // FilterTree, NewCondition, ConditionOperator, ... (filter editing)
//! // ListRequest, CountRequest, SortField (request bodies)
//! // Evaluator, ExpressionNode, EvaluationContext, Value, ... (formulas)
//! ```

// Filter types
pub use crate::filter::{
    Condition, ConditionGroup, ConditionOperator, ConditionUpdate, Filter, FilterNode, FilterTree, LogicalOperator,
    NewCondition, NodeId, RhsType, ValidationIssue,
};

// Request types
pub use crate::request::{CountRequest, ListRequest, SortField, SortOrder};

// Expression types
pub use crate::expression::{
    evaluate, EvalResult, EvaluationContext, EvaluationError, Evaluator, EvaluatorOptions, ExpressionNode,
    FunctionRegistry, LogicalMode, SystemValueProvider, Value,
};
