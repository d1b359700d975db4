//! Tests for the filter tree manager.

use std::collections::HashSet;

use serde_json::{json, Value as JsonValue};

use super::*;

// ==================== Test Helpers ====================

fn equal(field: &str, value: JsonValue) -> NewCondition {
    NewCondition::new(ConditionOperator::Equal, field).value(value)
}

fn contains_key(value: &JsonValue, key: &str) -> bool {
    match value {
        JsonValue::Object(map) => map.contains_key(key) || map.values().any(|v| contains_key(v, key)),
        JsonValue::Array(items) => items.iter().any(|v| contains_key(v, key)),
        _ => false,
    }
}

/// Builds a tree with two levels of nesting and returns the ids in creation order.
fn nested_tree() -> (FilterTree, Vec<NodeId>) {
    let mut tree = FilterTree::new();
    let mut ids = Vec::new();

    ids.push(tree.add_condition(equal("status", json!("open")), None).unwrap());
    let outer = tree.add_condition_group(LogicalOperator::Or, None).unwrap();
    ids.push(outer);
    ids.push(tree.add_condition(equal("owner", json!("me")), Some(&outer)).unwrap());
    let inner = tree.add_condition_group(LogicalOperator::And, Some(&outer)).unwrap();
    ids.push(inner);
    ids.push(tree.add_condition(equal("region", json!("eu")), Some(&inner)).unwrap());
    ids.push(
        tree.add_condition(
            NewCondition::new(ConditionOperator::GreaterThan, "amount").value(json!(500)),
            Some(&inner),
        )
        .unwrap(),
    );

    (tree, ids)
}

// ==================== Add / Get ====================

#[test]
fn test_new_tree_is_empty() {
    let tree = FilterTree::new();
    assert!(!tree.has_conditions());
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.root_operator(), LogicalOperator::And);
    assert!(tree.payload().is_none());
}

#[test]
fn test_add_condition_to_root() {
    let mut tree = FilterTree::new();
    let id = tree.add_condition(equal("status", json!("open")), None).unwrap();

    let node = tree.get_condition(&id).expect("node should exist");
    assert_eq!(node.id(), id);
    assert!(!node.is_group());
    assert!(tree.has_conditions());
    assert_eq!(tree.root().children().len(), 1);
}

#[test]
fn test_add_condition_to_nested_group() {
    let (tree, ids) = nested_tree();
    let inner = tree.get_condition(&ids[3]).unwrap().as_group().unwrap();

    assert_eq!(inner.children().len(), 2);
    assert_eq!(inner.children()[0].id(), ids[4]);
    assert_eq!(inner.children()[1].id(), ids[5]);
}

#[test]
fn test_add_to_missing_parent_is_noop() {
    let (mut tree, _) = nested_tree();
    let before = tree.clone();
    let stranger = FilterTree::new().add_condition(equal("x", json!(1)), None).unwrap();

    assert!(tree.add_condition(equal("y", json!(2)), Some(&stranger)).is_none());
    assert!(tree.add_condition_group(LogicalOperator::Or, Some(&stranger)).is_none());
    assert_eq!(tree, before);
}

#[test]
fn test_add_under_leaf_is_noop() {
    let (mut tree, ids) = nested_tree();
    let before = tree.len();

    assert!(tree.add_condition(equal("y", json!(2)), Some(&ids[0])).is_none());
    assert_eq!(tree.len(), before);
}

#[test]
fn test_add_under_root_id() {
    let mut tree = FilterTree::new();
    let root = tree.root().id();
    let id = tree.add_condition(equal("a", json!(1)), Some(&root)).unwrap();
    assert_eq!(tree.root().children()[0].id(), id);
}

#[test]
fn test_get_missing_returns_none() {
    let (tree, _) = nested_tree();
    let stranger = FilterTree::new().add_condition_group(LogicalOperator::And, None);
    assert!(tree.get_condition(&stranger.unwrap()).is_none());
}

// ==================== Identity ====================

#[test]
fn test_ids_are_unique_across_edits() {
    let (mut tree, ids) = nested_tree();
    tree.remove_condition(&ids[2]);
    tree.update_condition(&ids[0], ConditionUpdate::value(json!("closed")));
    let group = tree.add_condition_group(LogicalOperator::Not, Some(&ids[1])).unwrap();
    tree.add_condition(NewCondition::new(ConditionOperator::Empty, "notes"), Some(&group));

    let all = tree.ids();
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(all.len(), unique.len());
    assert_eq!(all.len(), tree.len());
    for id in &all {
        assert_eq!(tree.get_condition(id).unwrap().id(), *id);
    }
}

#[test]
fn test_separate_trees_do_not_share_ids() {
    let mut a = FilterTree::new();
    let mut b = FilterTree::new();
    let id_a = a.add_condition(equal("x", json!(1)), None).unwrap();
    let id_b = b.add_condition(equal("x", json!(1)), None).unwrap();

    assert_ne!(id_a, id_b);
    assert!(b.get_condition(&id_a).is_none());
}

// ==================== Update ====================

#[test]
fn test_update_condition_in_place() {
    let (mut tree, ids) = nested_tree();
    let changed = tree.update_condition(
        &ids[4],
        ConditionUpdate {
            operator: Some(ConditionOperator::In),
            rhs_value: Some(json!(["eu", "us"])),
            ..Default::default()
        },
    );
    assert!(changed);

    let leaf = tree.get_condition(&ids[4]).unwrap().as_condition().unwrap();
    assert_eq!(leaf.operator, ConditionOperator::In);
    assert_eq!(leaf.lhs_field, "region");
    assert_eq!(leaf.rhs_value, Some(json!(["eu", "us"])));
    assert_eq!(leaf.id(), ids[4]);
}

#[test]
fn test_update_condition_on_group_is_noop() {
    let (mut tree, ids) = nested_tree();
    let before = tree.clone();
    assert!(!tree.update_condition(&ids[1], ConditionUpdate::operator(ConditionOperator::Empty)));
    assert_eq!(tree, before);
}

#[test]
fn test_update_missing_condition_is_noop() {
    let (mut tree, ids) = nested_tree();
    tree.remove_condition(&ids[0]);
    let before = tree.clone();
    assert!(!tree.update_condition(&ids[0], ConditionUpdate::value(json!(1))));
    assert_eq!(tree, before);
}

#[test]
fn test_update_group_operator() {
    let (mut tree, ids) = nested_tree();
    assert!(tree.update_group_operator(&ids[3], LogicalOperator::Or));
    let group = tree.get_condition(&ids[3]).unwrap().as_group().unwrap();
    assert_eq!(group.operator, LogicalOperator::Or);
}

#[test]
fn test_update_group_operator_on_leaf_is_noop() {
    let (mut tree, ids) = nested_tree();
    let before = tree.clone();
    assert!(!tree.update_group_operator(&ids[0], LogicalOperator::Not));
    assert_eq!(tree, before);
}

// ==================== Remove ====================

#[test]
fn test_remove_leaf() {
    let (mut tree, ids) = nested_tree();
    assert!(tree.remove_condition(&ids[2]));
    assert!(tree.get_condition(&ids[2]).is_none());
    assert_eq!(tree.len(), 5);
}

#[test]
fn test_remove_group_cascades() {
    let (mut tree, ids) = nested_tree();
    assert!(tree.remove_condition(&ids[1]));

    for removed in &ids[1..] {
        assert!(tree.get_condition(removed).is_none());
    }
    assert!(tree.get_condition(&ids[0]).is_some());
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_remove_missing_is_noop() {
    let (mut tree, ids) = nested_tree();
    assert!(tree.remove_condition(&ids[3]));
    let before = tree.clone();

    // Second click on an already removed node.
    assert!(!tree.remove_condition(&ids[3]));
    assert!(!tree.remove_condition(&ids[4]));
    assert_eq!(tree, before);
}

#[test]
fn test_remove_root_is_noop() {
    let (mut tree, _) = nested_tree();
    let root = tree.root().id();
    assert!(!tree.remove_condition(&root));
    assert_eq!(tree.len(), 6);
}

#[test]
fn test_clear_all_conditions() {
    let (mut tree, ids) = nested_tree();
    tree.set_root_operator(LogicalOperator::Or);
    tree.clear_all_conditions();

    assert!(!tree.has_conditions());
    assert!(tree.payload().is_none());
    assert!(tree.get_condition(&ids[0]).is_none());
    assert_eq!(tree.root_operator(), LogicalOperator::Or);
}

// ==================== Payload ====================

#[test]
fn test_payload_shape() {
    let (mut tree, _) = nested_tree();
    tree.set_root_operator(LogicalOperator::Or);

    let payload = serde_json::to_value(tree.payload().unwrap()).unwrap();
    assert_eq!(
        payload,
        json!({
            "Operator": "Or",
            "Condition": [
                { "Operator": "Equal", "LHSField": "status", "RHSValue": "open", "RHSType": "Constant" },
                {
                    "Operator": "Or",
                    "Condition": [
                        { "Operator": "Equal", "LHSField": "owner", "RHSValue": "me", "RHSType": "Constant" },
                        {
                            "Operator": "And",
                            "Condition": [
                                { "Operator": "Equal", "LHSField": "region", "RHSValue": "eu", "RHSType": "Constant" },
                                { "Operator": "GreaterThan", "LHSField": "amount", "RHSValue": 500, "RHSType": "Constant" }
                            ]
                        }
                    ]
                }
            ]
        })
    );
}

#[test]
fn test_payload_never_contains_ids() {
    let (tree, _) = nested_tree();
    let payload = serde_json::to_value(tree.payload()).unwrap();
    assert!(!contains_key(&payload, "id"));
    assert!(!contains_key(&payload, "Id"));
}

#[test]
fn test_payload_is_deterministic_and_pure() {
    let (tree, _) = nested_tree();
    let before = tree.clone();

    let first = tree.payload();
    let second = tree.payload();

    assert_eq!(first, second);
    assert_eq!(tree, before);
}

#[test]
fn test_empty_group_yields_no_payload() {
    let mut tree = FilterTree::new();
    let group = tree.add_condition_group(LogicalOperator::And, None).unwrap();

    assert!(tree.has_conditions());
    assert!(tree.payload().is_none());

    tree.add_condition(equal("status", json!("open")), Some(&group));
    let payload = serde_json::to_value(tree.payload().unwrap()).unwrap();
    assert_eq!(
        payload,
        json!({
            "Operator": "And",
            "Condition": [
                {
                    "Operator": "And",
                    "Condition": [
                        { "Operator": "Equal", "LHSField": "status", "RHSValue": "open", "RHSType": "Constant" }
                    ]
                }
            ]
        })
    );
}

#[test]
fn test_payload_prunes_empty_nested_groups() {
    let mut tree = FilterTree::new();
    tree.add_condition(equal("a", json!(1)), None);
    let outer = tree.add_condition_group(LogicalOperator::Or, None).unwrap();
    tree.add_condition_group(LogicalOperator::And, Some(&outer));

    let payload = tree.payload().unwrap();
    assert_eq!(payload.condition.len(), 1);
    assert_eq!(payload.leaf_count(), 1);
}

#[test]
fn test_payload_drops_value_for_empty_operators() {
    let mut tree = FilterTree::new();
    let id = tree.add_condition(equal("notes", json!("stale")), None).unwrap();
    tree.update_condition(&id, ConditionUpdate::operator(ConditionOperator::Empty));

    let payload = serde_json::to_value(tree.payload().unwrap()).unwrap();
    assert_eq!(
        payload["Condition"][0],
        json!({ "Operator": "Empty", "LHSField": "notes", "RHSType": "Constant" })
    );
}

#[test]
fn test_payload_reference_types() {
    let mut tree = FilterTree::new();
    tree.add_condition(
        NewCondition::new(ConditionOperator::LessThan, "closed_at").field_ref("due_at"),
        None,
    );
    tree.add_condition(
        NewCondition::new(ConditionOperator::Equal, "region").env_ref("HOME_REGION"),
        None,
    );

    let payload = serde_json::to_value(tree.payload().unwrap()).unwrap();
    assert_eq!(payload["Condition"][0]["RHSType"], json!("Field"));
    assert_eq!(payload["Condition"][1]["RHSType"], json!("Environment"));
}

// ==================== Restore ====================

#[test]
fn test_from_payload_round_trip() {
    let (tree, _) = nested_tree();
    let payload = tree.payload().unwrap();

    let restored = FilterTree::from_payload(&payload);
    assert_eq!(restored.payload(), Some(payload));
    assert_eq!(restored.len(), tree.len());
}

#[test]
fn test_from_payload_assigns_fresh_ids() {
    let (tree, ids) = nested_tree();
    let restored = FilterTree::from_payload(&tree.payload().unwrap());

    for id in &ids {
        assert!(restored.get_condition(id).is_none());
    }
}

#[test]
fn test_from_payload_json() {
    let filter: Filter = serde_json::from_value(json!({
        "Operator": "Or",
        "Condition": [
            { "Operator": "In", "LHSField": "stage", "RHSValue": ["won", "lost"], "RHSType": "Constant" },
            { "Operator": "Not", "Condition": [ { "Operator": "Empty", "LHSField": "email" } ] }
        ]
    }))
    .unwrap();

    let tree = FilterTree::from_payload(&filter);
    assert_eq!(tree.root_operator(), LogicalOperator::Or);
    assert_eq!(tree.len(), 3);
    assert!(tree.validate().is_empty());
}
