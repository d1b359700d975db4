//! Readiness checks for a filter tree.
//!
//! Editing is allowed to pass through shapes that would be rejected by the
//! server (an empty OR group, a `Between` with one bound). [`FilterTree::validate`]
//! reports them so a caller can block submission without the tree refusing
//! intermediate states.

use std::fmt;

use serde_json::Value as JsonValue;

use super::node::{Condition, ConditionGroup, FilterNode, LogicalOperator, NodeId};
use super::tree::FilterTree;

/// A problem found by [`FilterTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Node the issue is attached to.
    pub node: NodeId,
    /// What is wrong.
    pub kind: IssueKind,
}

/// Kinds of validation issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A NOT group with zero or several children.
    NotGroupArity { children: usize },
    /// An AND/OR group below the root without children.
    EmptyGroup,
    /// A condition without a field name.
    MissingField,
    /// A value-taking condition without a value.
    MissingValue,
    /// A between-style value that is not a two-element array.
    InvalidRange,
    /// An in/not-in value that is not a non-empty array.
    InvalidMembership,
    /// A length bound whose value is not a non-negative number.
    InvalidLength,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::NotGroupArity { children } => {
                write!(f, "NOT group must have exactly one child, found {}", children)
            }
            IssueKind::EmptyGroup => write!(f, "group has no conditions"),
            IssueKind::MissingField => write!(f, "condition has no field"),
            IssueKind::MissingValue => write!(f, "condition has no value"),
            IssueKind::InvalidRange => write!(f, "range value must be an array of two values"),
            IssueKind::InvalidMembership => write!(f, "list value must be a non-empty array"),
            IssueKind::InvalidLength => write!(f, "length bound must be a non-negative number"),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node, self.kind)
    }
}

impl FilterTree {
    /// Checks the tree for shapes the server would reject.
    ///
    /// An empty root is valid (it produces no filter at all).
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let root = self.root();
        if root.operator == LogicalOperator::Not && !root.is_empty() {
            check_not_arity(root, &mut issues);
        }
        for child in root.children() {
            validate_node(child, &mut issues);
        }
        issues
    }
}

fn validate_node(node: &FilterNode, issues: &mut Vec<ValidationIssue>) {
    match node {
        FilterNode::Condition(condition) => validate_condition(condition, issues),
        FilterNode::Group(group) => {
            match group.operator {
                LogicalOperator::Not => check_not_arity(group, issues),
                LogicalOperator::And | LogicalOperator::Or => {
                    if group.is_empty() {
                        issues.push(ValidationIssue {
                            node: group.id(),
                            kind: IssueKind::EmptyGroup,
                        });
                    }
                }
            }
            for child in group.children() {
                validate_node(child, issues);
            }
        }
    }
}

fn check_not_arity(group: &ConditionGroup, issues: &mut Vec<ValidationIssue>) {
    let children = group.children().len();
    if children != 1 {
        issues.push(ValidationIssue {
            node: group.id(),
            kind: IssueKind::NotGroupArity { children },
        });
    }
}

fn validate_condition(condition: &Condition, issues: &mut Vec<ValidationIssue>) {
    let mut report = |kind| {
        issues.push(ValidationIssue {
            node: condition.id(),
            kind,
        })
    };

    if condition.lhs_field.trim().is_empty() {
        report(IssueKind::MissingField);
    }

    let operator = condition.operator;
    if !operator.takes_value() {
        return;
    }

    let Some(value) = &condition.rhs_value else {
        report(IssueKind::MissingValue);
        return;
    };

    if operator.is_range() && !matches!(value, JsonValue::Array(bounds) if bounds.len() == 2) {
        report(IssueKind::InvalidRange);
    } else if operator.is_membership() && !matches!(value, JsonValue::Array(items) if !items.is_empty()) {
        report(IssueKind::InvalidMembership);
    } else if operator.is_length_bound() && !value.as_f64().is_some_and(|n| n >= 0.0) {
        report(IssueKind::InvalidLength);
    }
}
