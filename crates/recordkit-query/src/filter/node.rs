//! Node types of the filter tree.
//!
//! A tree is made of two shapes: [`Condition`] leaves comparing one field
//! against a value, and [`ConditionGroup`] nodes combining children with a
//! logical operator. [`FilterNode`] is the sum of the two.
//!
//! Nodes carry a [`NodeId`] that only the [`FilterTree`](super::FilterTree)
//! can assign, so every node reachable from a tree was created through it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Stable identity of a node within a filter tree.
///
/// Assigned once at creation and never recomputed. Identities never appear in
/// the wire payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Comparison applied by a [`Condition`].
///
/// Serializes to the PascalCase operator names of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    Empty,
    NotEmpty,
    Contains,
    NotContains,
    MinLength,
    MaxLength,
}

impl ConditionOperator {
    /// Returns true for operators whose value is a `[low, high]` pair.
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Between | Self::NotBetween)
    }

    /// Returns true for operators whose value is a list of candidates.
    pub fn is_membership(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Returns true for length bounds, whose value is a number.
    pub fn is_length_bound(&self) -> bool {
        matches!(self, Self::MinLength | Self::MaxLength)
    }

    /// Returns false for operators that ignore the right-hand side.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Empty | Self::NotEmpty)
    }
}

/// Logical operator of a [`ConditionGroup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
    Not,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "And"),
            LogicalOperator::Or => write!(f, "Or"),
            LogicalOperator::Not => write!(f, "Not"),
        }
    }
}

/// What the right-hand side of a condition refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhsType {
    /// A literal value.
    #[default]
    Constant,
    /// The name of another field on the same record.
    Field,
    /// The name of an environment variable resolved by the server.
    Environment,
}

/// Leaf predicate comparing one field against a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub(crate) id: NodeId,
    /// Comparison to apply.
    pub operator: ConditionOperator,
    /// Field on the left-hand side.
    pub lhs_field: String,
    /// Right-hand side; ignored by [`ConditionOperator::Empty`] and
    /// [`ConditionOperator::NotEmpty`].
    pub rhs_value: Option<JsonValue>,
    /// Interpretation of `rhs_value`.
    pub rhs_type: RhsType,
}

impl Condition {
    pub(crate) fn from_draft(id: NodeId, draft: NewCondition) -> Self {
        Self {
            id,
            operator: draft.operator,
            lhs_field: draft.lhs_field,
            rhs_value: draft.rhs_value,
            rhs_type: draft.rhs_type,
        }
    }

    /// Returns the node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn apply(&mut self, update: ConditionUpdate) {
        if let Some(operator) = update.operator {
            self.operator = operator;
        }
        if let Some(field) = update.lhs_field {
            self.lhs_field = field;
        }
        if let Some(value) = update.rhs_value {
            self.rhs_value = Some(value);
        }
        if let Some(rhs_type) = update.rhs_type {
            self.rhs_type = rhs_type;
        }
    }
}

/// Boolean combinator over an ordered list of children.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub(crate) id: NodeId,
    /// How the children are combined.
    pub operator: LogicalOperator,
    pub(crate) children: Vec<FilterNode>,
}

impl ConditionGroup {
    pub(crate) fn new(id: NodeId, operator: LogicalOperator) -> Self {
        Self {
            id,
            operator,
            children: Vec::new(),
        }
    }

    /// Returns the node identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the children in order.
    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    /// Returns true if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node of the filter tree: either a leaf condition or a group.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Condition(Condition),
    Group(ConditionGroup),
}

impl FilterNode {
    /// Returns the node identity.
    pub fn id(&self) -> NodeId {
        match self {
            FilterNode::Condition(condition) => condition.id,
            FilterNode::Group(group) => group.id,
        }
    }

    /// Returns true if the node is a [`ConditionGroup`].
    pub fn is_group(&self) -> bool {
        matches!(self, FilterNode::Group(_))
    }

    /// Returns the leaf, if this node is one.
    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            FilterNode::Condition(condition) => Some(condition),
            FilterNode::Group(_) => None,
        }
    }

    /// Returns the group, if this node is one.
    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            FilterNode::Group(group) => Some(group),
            FilterNode::Condition(_) => None,
        }
    }
}

/// A condition that has not been added to a tree yet.
///
/// # Example
///
/// ```
/// use recordkit_query::filter::{ConditionOperator, NewCondition, RhsType};
/// use serde_json::json;
///
/// let draft = NewCondition::new(ConditionOperator::GreaterThan, "amount")
///     .value(json!(100));
/// assert_eq!(draft.rhs_type, RhsType::Constant);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCondition {
    pub operator: ConditionOperator,
    pub lhs_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs_value: Option<JsonValue>,
    #[serde(default)]
    pub rhs_type: RhsType,
}

impl NewCondition {
    /// Creates a draft with no right-hand side.
    pub fn new(operator: ConditionOperator, lhs_field: impl Into<String>) -> Self {
        Self {
            operator,
            lhs_field: lhs_field.into(),
            rhs_value: None,
            rhs_type: RhsType::Constant,
        }
    }

    /// Sets a constant right-hand side.
    pub fn value(mut self, value: impl Into<JsonValue>) -> Self {
        self.rhs_value = Some(value.into());
        self
    }

    /// Compares against another field instead of a constant.
    pub fn field_ref(mut self, field: impl Into<String>) -> Self {
        self.rhs_value = Some(JsonValue::String(field.into()));
        self.rhs_type = RhsType::Field;
        self
    }

    /// Compares against an environment variable instead of a constant.
    pub fn env_ref(mut self, name: impl Into<String>) -> Self {
        self.rhs_value = Some(JsonValue::String(name.into()));
        self.rhs_type = RhsType::Environment;
        self
    }
}

/// Partial update of a [`Condition`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lhs_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs_value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs_type: Option<RhsType>,
}

impl ConditionUpdate {
    /// Update that only changes the operator.
    pub fn operator(operator: ConditionOperator) -> Self {
        Self {
            operator: Some(operator),
            ..Default::default()
        }
    }

    /// Update that only changes the constant value.
    pub fn value(value: impl Into<JsonValue>) -> Self {
        Self {
            rhs_value: Some(value.into()),
            ..Default::default()
        }
    }
}
