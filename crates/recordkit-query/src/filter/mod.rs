//! Editable query-filter tree and its wire payload.
//!
//! A filter is a tree of [`Condition`] leaves and [`ConditionGroup`] nodes
//! owned by a [`FilterTree`]. The tree is edited by node identity and turned
//! into an identity-free [`Filter`] payload on demand, which is what a
//! `list`/`count` request carries.
//!
//! # Example
//!
//! ```
//! use recordkit_query::filter::{ConditionOperator, FilterTree, LogicalOperator, NewCondition};
//! use serde_json::json;
//!
//! let mut tree = FilterTree::new();
//! let open = tree
//!     .add_condition(NewCondition::new(ConditionOperator::Equal, "status").value("open"), None)
//!     .unwrap();
//!
//! let either = tree.add_condition_group(LogicalOperator::Or, None).unwrap();
//! tree.add_condition(NewCondition::new(ConditionOperator::GreaterThan, "amount").value(1000), Some(&either));
//! tree.add_condition(NewCondition::new(ConditionOperator::Equal, "vip").value(true), Some(&either));
//!
//! assert!(tree.get_condition(&open).is_some());
//! let payload = serde_json::to_value(tree.payload()).unwrap();
//! assert_eq!(payload["Operator"], json!("And"));
//! assert_eq!(payload["Condition"][1]["Operator"], json!("Or"));
//! ```

mod node;
mod payload;
mod tree;
mod validate;

pub use node::{
    Condition, ConditionGroup, ConditionOperator, ConditionUpdate, FilterNode, LogicalOperator, NewCondition,
    NodeId, RhsType,
};
pub use payload::{Filter, FilterClause, FilterCondition};
pub use tree::FilterTree;
pub use validate::{IssueKind, ValidationIssue};

#[cfg(test)]
mod tests;
