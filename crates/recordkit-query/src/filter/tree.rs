//! Stateful owner of an editable filter tree.
//!
//! [`FilterTree`] owns a root [`ConditionGroup`] and exposes mutation by node
//! identity. Lookups that miss never fail loudly: adding under an unknown
//! parent returns `None`, updating or removing an unknown id returns `false`,
//! and the tree is left as it was. Interactive editors can then react to
//! "nothing changed" instead of handling errors raised by stale clicks.

use tracing::debug;

use super::node::{Condition, ConditionGroup, ConditionUpdate, FilterNode, LogicalOperator, NewCondition, NodeId};
use super::payload::{Filter, FilterClause};

/// Editable filter tree for one editing session.
///
/// # Example
///
/// ```
/// use recordkit_query::filter::{ConditionOperator, FilterTree, LogicalOperator, NewCondition};
///
/// let mut tree = FilterTree::new();
/// let group = tree.add_condition_group(LogicalOperator::Or, None).unwrap();
/// tree.add_condition(NewCondition::new(ConditionOperator::Empty, "email"), Some(&group));
/// tree.add_condition(NewCondition::new(ConditionOperator::Empty, "phone"), Some(&group));
///
/// let payload = tree.payload().unwrap();
/// assert_eq!(payload.leaf_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTree {
    root: ConditionGroup,
}

impl Default for FilterTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterTree {
    /// Creates an empty tree whose root combines children with AND.
    pub fn new() -> Self {
        Self::with_root_operator(LogicalOperator::And)
    }

    /// Creates an empty tree with the given root operator.
    pub fn with_root_operator(operator: LogicalOperator) -> Self {
        Self {
            root: ConditionGroup::new(NodeId::generate(), operator),
        }
    }

    /// Rebuilds a tree from a previously serialized payload.
    ///
    /// Every node gets a fresh identity, so `from_payload(p).payload()`
    /// equals `p` as long as `p` has no empty groups.
    pub fn from_payload(filter: &Filter) -> Self {
        let mut tree = Self::with_root_operator(filter.operator);
        let root_id = tree.root.id;
        tree.load_clauses(&filter.condition, &root_id);
        tree
    }

    fn load_clauses(&mut self, clauses: &[FilterClause], parent: &NodeId) {
        for clause in clauses {
            match clause {
                FilterClause::Condition(leaf) => {
                    let draft = NewCondition {
                        operator: leaf.operator,
                        lhs_field: leaf.lhs_field.clone(),
                        rhs_value: leaf.rhs_value.clone(),
                        rhs_type: leaf.rhs_type,
                    };
                    self.add_condition(draft, Some(parent));
                }
                FilterClause::Group(group) => {
                    if let Some(id) = self.add_condition_group(group.operator, Some(parent)) {
                        self.load_clauses(&group.condition, &id);
                    }
                }
            }
        }
    }

    // ==================== Queries ====================

    /// Returns the root group.
    pub fn root(&self) -> &ConditionGroup {
        &self.root
    }

    /// Returns the operator used when the root is serialized.
    pub fn root_operator(&self) -> LogicalOperator {
        self.root.operator
    }

    /// Looks up a node anywhere below the root, depth-first.
    ///
    /// The root itself is not a [`FilterNode`]; use [`FilterTree::root`].
    pub fn get_condition(&self, id: &NodeId) -> Option<&FilterNode> {
        find_node(&self.root.children, id)
    }

    /// Returns true if the root has at least one direct child.
    ///
    /// A child may be an empty group, which [`FilterTree::payload`] prunes, so
    /// this can be true while `payload()` is `None`. Use `payload().is_some()`
    /// to ask whether a filter would be sent.
    pub fn has_conditions(&self) -> bool {
        !self.root.children.is_empty()
    }

    /// Returns the number of nodes below the root.
    pub fn len(&self) -> usize {
        count_nodes(&self.root.children)
    }

    /// Returns true if the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Returns the ids of every node below the root in depth-first order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.len());
        collect_ids(&self.root.children, &mut ids);
        ids
    }

    /// Returns the wire payload, or `None` if nothing would be filtered.
    ///
    /// The live tree is not touched; calling this twice without mutation
    /// yields equal values.
    pub fn payload(&self) -> Option<Filter> {
        Filter::from_group(&self.root)
    }

    // ==================== Mutations ====================

    /// Adds a leaf under `parent_id`, or under the root when `None`.
    ///
    /// Returns the new node's id, or `None` if `parent_id` does not name a
    /// group in this tree.
    pub fn add_condition(&mut self, condition: NewCondition, parent_id: Option<&NodeId>) -> Option<NodeId> {
        let id = NodeId::generate();
        let node = FilterNode::Condition(Condition::from_draft(id, condition));
        self.attach(node, parent_id)
    }

    /// Adds an empty group under `parent_id`, or under the root when `None`.
    ///
    /// Returns the new group's id, or `None` if `parent_id` does not name a
    /// group in this tree.
    pub fn add_condition_group(&mut self, operator: LogicalOperator, parent_id: Option<&NodeId>) -> Option<NodeId> {
        let id = NodeId::generate();
        let node = FilterNode::Group(ConditionGroup::new(id, operator));
        self.attach(node, parent_id)
    }

    fn attach(&mut self, node: FilterNode, parent_id: Option<&NodeId>) -> Option<NodeId> {
        let id = node.id();
        let parent = match parent_id {
            None => &mut self.root,
            Some(parent_id) => match find_group_mut(&mut self.root, parent_id) {
                Some(group) => group,
                None => {
                    debug!(parent = %parent_id, "parent group not found, node not added");
                    return None;
                }
            },
        };
        debug!(%id, parent = %parent.id, group = node.is_group(), "added filter node");
        parent.children.push(node);
        Some(id)
    }

    /// Applies a partial update to a leaf.
    ///
    /// Returns `false` if `id` is unknown or names a group.
    pub fn update_condition(&mut self, id: &NodeId, update: ConditionUpdate) -> bool {
        match find_node_mut(&mut self.root.children, id) {
            Some(FilterNode::Condition(condition)) => {
                condition.apply(update);
                debug!(%id, "updated condition");
                true
            }
            Some(FilterNode::Group(_)) => {
                debug!(%id, "update_condition called on a group, ignored");
                false
            }
            None => {
                debug!(%id, "condition not found, update ignored");
                false
            }
        }
    }

    /// Changes the operator of a group, including the root.
    ///
    /// Returns `false` if `id` is unknown or names a leaf.
    pub fn update_group_operator(&mut self, id: &NodeId, operator: LogicalOperator) -> bool {
        match find_group_mut(&mut self.root, id) {
            Some(group) => {
                group.operator = operator;
                debug!(%id, %operator, "updated group operator");
                true
            }
            None => {
                debug!(%id, "group not found, operator change ignored");
                false
            }
        }
    }

    /// Removes a node and, for a group, everything below it.
    ///
    /// Returns `false` if `id` is unknown. The root cannot be removed.
    pub fn remove_condition(&mut self, id: &NodeId) -> bool {
        match remove_node(&mut self.root.children, id) {
            Some(removed) => {
                let detached = match &removed {
                    FilterNode::Group(group) => count_nodes(&group.children),
                    FilterNode::Condition(_) => 0,
                };
                debug!(%id, detached, "removed filter node");
                true
            }
            None => {
                debug!(%id, "node not found, removal ignored");
                false
            }
        }
    }

    /// Removes every node below the root. The root operator is kept.
    pub fn clear_all_conditions(&mut self) {
        debug!(removed = self.len(), "cleared filter tree");
        self.root.children.clear();
    }

    /// Sets the operator used when the root is serialized.
    pub fn set_root_operator(&mut self, operator: LogicalOperator) {
        self.root.operator = operator;
    }
}

fn find_node<'a>(children: &'a [FilterNode], id: &NodeId) -> Option<&'a FilterNode> {
    children.iter().find_map(|child| {
        if child.id() == *id {
            return Some(child);
        }
        match child {
            FilterNode::Group(group) => find_node(&group.children, id),
            FilterNode::Condition(_) => None,
        }
    })
}

fn find_node_mut<'a>(children: &'a mut [FilterNode], id: &NodeId) -> Option<&'a mut FilterNode> {
    for child in children.iter_mut() {
        if child.id() == *id {
            return Some(child);
        }
        if let FilterNode::Group(group) = child {
            if let Some(found) = find_node_mut(&mut group.children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_group_mut<'a>(group: &'a mut ConditionGroup, id: &NodeId) -> Option<&'a mut ConditionGroup> {
    if group.id == *id {
        return Some(group);
    }
    group.children.iter_mut().find_map(|child| match child {
        FilterNode::Group(inner) => find_group_mut(inner, id),
        FilterNode::Condition(_) => None,
    })
}

fn remove_node(children: &mut Vec<FilterNode>, id: &NodeId) -> Option<FilterNode> {
    if let Some(index) = children.iter().position(|child| child.id() == *id) {
        return Some(children.remove(index));
    }
    children.iter_mut().find_map(|child| match child {
        FilterNode::Group(group) => remove_node(&mut group.children, id),
        FilterNode::Condition(_) => None,
    })
}

fn count_nodes(children: &[FilterNode]) -> usize {
    children
        .iter()
        .map(|child| match child {
            FilterNode::Group(group) => 1 + count_nodes(&group.children),
            FilterNode::Condition(_) => 1,
        })
        .sum()
}

fn collect_ids(children: &[FilterNode], ids: &mut Vec<NodeId>) {
    for child in children {
        ids.push(child.id());
        if let FilterNode::Group(group) = child {
            collect_ids(&group.children, ids);
        }
    }
}
