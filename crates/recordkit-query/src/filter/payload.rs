//! Wire form of a filter tree.
//!
//! These types mirror [`ConditionGroup`] and [`Condition`] without any node
//! identity. They are what a `list`/`count` request carries as its `Filter`:
//!
//! ```json
//! {
//!   "Operator": "And",
//!   "Condition": [
//!     { "Operator": "Equal", "LHSField": "status", "RHSValue": "open", "RHSType": "Constant" },
//!     { "Operator": "Or", "Condition": [ ... ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::node::{Condition, ConditionGroup, ConditionOperator, FilterNode, LogicalOperator, RhsType};

/// Identity-free group, the root of a request filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "Operator")]
    pub operator: LogicalOperator,
    #[serde(rename = "Condition", default)]
    pub condition: Vec<FilterClause>,
}

/// One entry of a [`Filter`]: a nested group or a leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterClause {
    Group(Filter),
    Condition(FilterCondition),
}

/// Identity-free leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    #[serde(rename = "Operator")]
    pub operator: ConditionOperator,
    #[serde(rename = "LHSField")]
    pub lhs_field: String,
    #[serde(rename = "RHSValue", default, skip_serializing_if = "Option::is_none")]
    pub rhs_value: Option<JsonValue>,
    #[serde(rename = "RHSType", default)]
    pub rhs_type: RhsType,
}

impl Filter {
    /// Builds the wire form of a group, dropping identities.
    ///
    /// Nested groups that end up without clauses are pruned. Returns `None`
    /// if the group itself has no clauses left.
    pub(crate) fn from_group(group: &ConditionGroup) -> Option<Self> {
        let condition: Vec<FilterClause> = group.children.iter().filter_map(FilterClause::from_node).collect();
        if condition.is_empty() {
            return None;
        }
        Some(Self {
            operator: group.operator,
            condition,
        })
    }

    /// Returns the number of leaves at any depth.
    pub fn leaf_count(&self) -> usize {
        self.condition
            .iter()
            .map(|clause| match clause {
                FilterClause::Group(group) => group.leaf_count(),
                FilterClause::Condition(_) => 1,
            })
            .sum()
    }
}

impl FilterClause {
    fn from_node(node: &FilterNode) -> Option<Self> {
        match node {
            FilterNode::Condition(condition) => Some(FilterClause::Condition(FilterCondition::from(condition))),
            FilterNode::Group(group) => Filter::from_group(group).map(FilterClause::Group),
        }
    }
}

impl From<&Condition> for FilterCondition {
    fn from(condition: &Condition) -> Self {
        let rhs_value = if condition.operator.takes_value() {
            condition.rhs_value.clone()
        } else {
            None
        };
        Self {
            operator: condition.operator,
            lhs_field: condition.lhs_field.clone(),
            rhs_value,
            rhs_type: condition.rhs_type,
        }
    }
}
