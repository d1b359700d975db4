//! Expression tree produced by the formula parser.
//!
//! Trees arrive as JSON objects with a `type` tag:
//!
//! ```json
//! { "type": "BinaryExpression", "operator": ">",
//!   "args": [ { "type": "Identifier", "name": "amount" },
//!             { "type": "Literal", "value": 100 } ] }
//! ```
//!
//! Unknown `type` tags deserialize into [`NodeKind::Unsupported`] so the
//! evaluator can report them instead of failing at load time.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// The property accessed on the value a node produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct ExpressionNode {
    /// What the node computes.
    pub kind: NodeKind,
    /// Property to read from the result, used by member and system lookups.
    pub property: Option<Property>,
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A constant.
    Literal { value: Value },
    /// A form field reference.
    Identifier { name: String },
    /// A system value reference (`NOW`, `TODAY`, `CURRENT_USER`).
    SystemIdentifier { name: String },
    /// Comparison or arithmetic on exactly two arguments.
    Binary { operator: String, args: Vec<ExpressionNode> },
    /// `AND`, `OR` or `!` over one or more arguments.
    Logical { operator: String, args: Vec<ExpressionNode> },
    /// A registered function call.
    Call { callee: Option<String>, args: Vec<ExpressionNode> },
    /// Property access on the first argument.
    Member { args: Vec<ExpressionNode> },
    /// Evaluates its first argument; no binding takes place.
    Assignment { args: Vec<ExpressionNode> },
    /// A `type` tag with no known meaning.
    Unsupported { node_type: String },
}

impl NodeKind {
    /// The wire `type` tag for this variant.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Literal { .. } => "Literal",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::SystemIdentifier { .. } => "SystemIdentifier",
            NodeKind::Binary { .. } => "BinaryExpression",
            NodeKind::Logical { .. } => "LogicalExpression",
            NodeKind::Call { .. } => "CallExpression",
            NodeKind::Member { .. } => "MemberExpression",
            NodeKind::Assignment { .. } => "AssignmentExpression",
            NodeKind::Unsupported { node_type } => node_type,
        }
    }
}

impl ExpressionNode {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, property: None }
    }

    /// Attaches a property to read from this node's result.
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.property = Some(Property::new(name));
        self
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Literal { value: value.into() })
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Identifier { name: name.into() })
    }

    pub fn system(name: impl Into<String>) -> Self {
        Self::new(NodeKind::SystemIdentifier { name: name.into() })
    }

    pub fn binary(operator: impl Into<String>, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::new(NodeKind::Binary {
            operator: operator.into(),
            args: vec![left, right],
        })
    }

    pub fn logical(operator: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        Self::new(NodeKind::Logical {
            operator: operator.into(),
            args,
        })
    }

    pub fn call(callee: impl Into<String>, args: Vec<ExpressionNode>) -> Self {
        Self::new(NodeKind::Call {
            callee: Some(callee.into()),
            args,
        })
    }

    /// Member access: reads `object.property` from the first argument.
    pub fn member(object: ExpressionNode) -> Self {
        Self::new(NodeKind::Member { args: vec![object] })
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(ExpressionNode::node_count).sum::<usize>()
    }

    /// Direct child nodes.
    pub fn children(&self) -> &[ExpressionNode] {
        match &self.kind {
            NodeKind::Binary { args, .. }
            | NodeKind::Logical { args, .. }
            | NodeKind::Call { args, .. }
            | NodeKind::Member { args }
            | NodeKind::Assignment { args } => args,
            NodeKind::Literal { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::SystemIdentifier { .. }
            | NodeKind::Unsupported { .. } => &[],
        }
    }
}

/// Flat wire shape shared by every node type.
#[derive(Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Value::is_undefined")]
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    callee: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<ExpressionNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property: Option<Property>,
}

impl From<RawNode> for ExpressionNode {
    fn from(raw: RawNode) -> Self {
        let name = raw.name.unwrap_or_default();
        let operator = raw.operator.unwrap_or_default();
        let kind = match raw.node_type.as_str() {
            "Literal" => NodeKind::Literal { value: raw.value },
            "Identifier" => NodeKind::Identifier { name },
            "SystemIdentifier" => NodeKind::SystemIdentifier { name },
            "BinaryExpression" => NodeKind::Binary {
                operator,
                args: raw.args,
            },
            "LogicalExpression" => NodeKind::Logical {
                operator,
                args: raw.args,
            },
            "CallExpression" => NodeKind::Call {
                callee: raw.callee.filter(|c| !c.is_empty()),
                args: raw.args,
            },
            "MemberExpression" => NodeKind::Member { args: raw.args },
            "AssignmentExpression" => NodeKind::Assignment { args: raw.args },
            _ => NodeKind::Unsupported {
                node_type: raw.node_type,
            },
        };
        ExpressionNode {
            kind,
            property: raw.property,
        }
    }
}

impl From<ExpressionNode> for RawNode {
    fn from(node: ExpressionNode) -> Self {
        let mut raw = RawNode {
            node_type: node.kind.type_name().to_string(),
            value: Value::Undefined,
            name: None,
            operator: None,
            callee: None,
            args: Vec::new(),
            property: node.property,
        };
        match node.kind {
            NodeKind::Literal { value } => raw.value = value,
            NodeKind::Identifier { name } | NodeKind::SystemIdentifier { name } => raw.name = Some(name),
            NodeKind::Binary { operator, args } | NodeKind::Logical { operator, args } => {
                raw.operator = Some(operator);
                raw.args = args;
            }
            NodeKind::Call { callee, args } => {
                raw.callee = callee;
                raw.args = args;
            }
            NodeKind::Member { args } | NodeKind::Assignment { args } => raw.args = args,
            NodeKind::Unsupported { .. } => {}
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_binary() {
        let node: ExpressionNode = serde_json::from_value(json!({
            "type": "BinaryExpression",
            "operator": ">",
            "args": [
                { "type": "Identifier", "name": "amount" },
                { "type": "Literal", "value": 100 }
            ]
        }))
        .unwrap();

        assert_eq!(
            node,
            ExpressionNode::binary(">", ExpressionNode::identifier("amount"), ExpressionNode::literal(100))
        );
        assert_eq!(node.node_count(), 3);
    }

    #[test]
    fn test_literal_null_differs_from_missing_value() {
        let null: ExpressionNode = serde_json::from_value(json!({ "type": "Literal", "value": null })).unwrap();
        let missing: ExpressionNode = serde_json::from_value(json!({ "type": "Literal" })).unwrap();

        assert_eq!(null.kind, NodeKind::Literal { value: Value::Null });
        assert_eq!(missing.kind, NodeKind::Literal { value: Value::Undefined });
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let node: ExpressionNode = serde_json::from_value(json!({ "type": "ConditionalExpression" })).unwrap();
        assert_eq!(
            node.kind,
            NodeKind::Unsupported {
                node_type: "ConditionalExpression".to_string()
            }
        );
        assert_eq!(node.kind.type_name(), "ConditionalExpression");
    }

    #[test]
    fn test_empty_callee_is_missing() {
        let node: ExpressionNode =
            serde_json::from_value(json!({ "type": "CallExpression", "callee": "", "args": [] })).unwrap();
        assert_eq!(
            node.kind,
            NodeKind::Call {
                callee: None,
                args: vec![]
            }
        );
    }

    #[test]
    fn test_property_round_trip() {
        let node = ExpressionNode::system("CURRENT_USER").with_property("email");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            json!({ "type": "SystemIdentifier", "name": "CURRENT_USER", "property": { "name": "email" } })
        );
        let back: ExpressionNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
