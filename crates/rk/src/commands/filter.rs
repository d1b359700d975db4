//! Filter command implementation.
//!
//! Replays an edit script through a [`FilterTree`] and prints the resulting
//! payload. Scripts name the nodes they create with a symbolic `ref`, which
//! later steps use as `parent` or `target`:
//!
//! ```json
//! {
//!   "root_operator": "And",
//!   "steps": [
//!     { "op": "add_group", "ref": "either", "operator": "Or" },
//!     { "op": "add_condition", "ref": "big", "parent": "either",
//!       "condition": { "operator": "GreaterThan", "lhs_field": "amount", "rhs_value": 1000 } },
//!     { "op": "update", "target": "big", "update": { "rhs_value": 5000 } }
//!   ]
//! }
//! ```
//!
//! A ref that was never bound is a script error. A ref that points at a node
//! removed by an earlier step is skipped with a warning, matching the tree's
//! own no-op policy.

use std::collections::HashMap;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use recordkit_query::filter::{ConditionUpdate, FilterTree, LogicalOperator, NewCondition, NodeId};
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::Config;
use super::{read_json, CommandContext, CommandError, Result};
use crate::cli::RequestKind;

/// An edit script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Root operator; falls back to the configured default.
    #[serde(default)]
    pub root_operator: Option<LogicalOperator>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One edit.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    AddCondition {
        #[serde(rename = "ref")]
        name: Option<String>,
        parent: Option<String>,
        condition: NewCondition,
    },
    AddGroup {
        #[serde(rename = "ref")]
        name: Option<String>,
        parent: Option<String>,
        operator: LogicalOperator,
    },
    Update {
        target: String,
        update: ConditionUpdate,
    },
    SetGroupOperator {
        target: String,
        operator: LogicalOperator,
    },
    Remove {
        target: String,
    },
    SetRootOperator {
        operator: LogicalOperator,
    },
    Clear,
}

/// Outcome of replaying a script.
#[derive(Debug)]
pub struct Replay {
    pub tree: FilterTree,
    /// Indexes of steps that changed nothing.
    pub skipped: Vec<usize>,
}

/// Replays `script` on a fresh tree.
///
/// The reserved ref `root` names the root group. Refs are rebound when a
/// later step reuses them.
pub fn replay(script: &Script, default_root: LogicalOperator) -> Result<Replay> {
    let mut tree = FilterTree::with_root_operator(script.root_operator.unwrap_or(default_root));
    let mut refs: HashMap<String, NodeId> = HashMap::new();
    refs.insert("root".to_string(), tree.root().id());
    let mut skipped = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        let applied = match step {
            Step::AddCondition { name, parent, condition } => {
                let parent_id = resolve_parent(&refs, parent.as_deref(), index)?;
                let id = tree.add_condition(condition.clone(), parent_id.as_ref());
                bind(&mut refs, name, id)
            }
            Step::AddGroup { name, parent, operator } => {
                let parent_id = resolve_parent(&refs, parent.as_deref(), index)?;
                let id = tree.add_condition_group(*operator, parent_id.as_ref());
                bind(&mut refs, name, id)
            }
            Step::Update { target, update } => {
                let id = resolve(&refs, target, index)?;
                tree.update_condition(&id, update.clone())
            }
            Step::SetGroupOperator { target, operator } => {
                let id = resolve(&refs, target, index)?;
                tree.update_group_operator(&id, *operator)
            }
            Step::Remove { target } => {
                let id = resolve(&refs, target, index)?;
                tree.remove_condition(&id)
            }
            Step::SetRootOperator { operator } => {
                tree.set_root_operator(*operator);
                true
            }
            Step::Clear => {
                tree.clear_all_conditions();
                true
            }
        };

        if applied {
            debug!(step = index, "applied script step");
        } else {
            warn!(step = index, "script step changed nothing");
            skipped.push(index);
        }
    }

    Ok(Replay { tree, skipped })
}

fn resolve(refs: &HashMap<String, NodeId>, name: &str, step: usize) -> Result<NodeId> {
    refs.get(name)
        .copied()
        .ok_or_else(|| CommandError::Script(format!("step {}: unknown ref '{}'", step, name)))
}

fn resolve_parent(refs: &HashMap<String, NodeId>, parent: Option<&str>, step: usize) -> Result<Option<NodeId>> {
    parent.map(|name| resolve(refs, name, step)).transpose()
}

fn bind(refs: &mut HashMap<String, NodeId>, name: &Option<String>, id: Option<NodeId>) -> bool {
    match (name, id) {
        (Some(name), Some(id)) => {
            refs.insert(name.clone(), id);
            true
        }
        (None, Some(_)) => true,
        (_, None) => false,
    }
}

/// Options for the filter command.
pub struct FilterOptions {
    /// Script JSON file.
    pub script: PathBuf,
    /// Request body to wrap the payload in.
    pub request: Option<RequestKind>,
    /// Fail on validation issues.
    pub validate: bool,
}

/// Executes the filter command.
pub fn execute(ctx: &CommandContext, opts: &FilterOptions, config: &Config) -> Result<()> {
    let script: Script = read_json(&opts.script)?;
    let default_root = config.filter.root_operator.unwrap_or_default();
    let Replay { tree, skipped } = replay(&script, default_root)?;

    let issues = tree.validate();
    if opts.validate && !issues.is_empty() {
        let details: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return Err(CommandError::Script(format!(
            "{} validation issue(s): {}",
            issues.len(),
            details.join("; ")
        )));
    }

    let body = match opts.request {
        None => serde_json::to_value(tree.payload())?,
        Some(RequestKind::List) => serde_json::to_value(tree.to_list_request())?,
        Some(RequestKind::Count) => serde_json::to_value(tree.to_count_request())?,
    };

    if ctx.json_output {
        let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
        let output = serde_json::json!({
            "payload": body,
            "nodes": tree.len(),
            "skipped_steps": skipped,
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&body)?);

    for issue in &issues {
        let line = format!("warning: {}", issue);
        if ctx.use_colors {
            eprintln!("{}", line.yellow());
        } else {
            eprintln!("{}", line);
        }
    }
    if ctx.verbose && !skipped.is_empty() {
        eprintln!("skipped steps: {:?}", skipped);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordkit_query::filter::Filter;
    use serde_json::json;

    fn script(value: serde_json::Value) -> Script {
        serde_json::from_value(value).unwrap()
    }

    fn payload_json(replay: &Replay) -> serde_json::Value {
        serde_json::to_value(replay.tree.payload()).unwrap()
    }

    #[test]
    fn test_replay_builds_nested_tree() {
        let replay = replay(
            &script(json!({
                "steps": [
                    { "op": "add_condition", "condition": { "operator": "NotEmpty", "lhs_field": "email" } },
                    { "op": "add_group", "ref": "either", "operator": "Or" },
                    { "op": "add_condition", "ref": "big", "parent": "either",
                      "condition": { "operator": "GreaterThan", "lhs_field": "amount", "rhs_value": 1000 } },
                    { "op": "add_condition", "parent": "either",
                      "condition": { "operator": "Equal", "lhs_field": "vip", "rhs_value": true } },
                    { "op": "update", "target": "big", "update": { "rhs_value": 5000 } }
                ]
            })),
            LogicalOperator::And,
        )
        .unwrap();

        assert!(replay.skipped.is_empty());
        let payload = payload_json(&replay);
        assert_eq!(payload["Operator"], json!("And"));
        assert_eq!(payload["Condition"][1]["Operator"], json!("Or"));
        assert_eq!(payload["Condition"][1]["Condition"][0]["RHSValue"], json!(5000));
    }

    #[test]
    fn test_replay_uses_default_root_operator() {
        let replay = replay(
            &script(json!({ "steps": [ { "op": "add_condition", "condition": { "operator": "Empty", "lhs_field": "x" } } ] })),
            LogicalOperator::Or,
        )
        .unwrap();
        assert_eq!(replay.tree.root_operator(), LogicalOperator::Or);

        let explicit = super::replay(&script(json!({ "root_operator": "And", "steps": [] })), LogicalOperator::Or).unwrap();
        assert_eq!(explicit.tree.root_operator(), LogicalOperator::And);
    }

    #[test]
    fn test_replay_root_ref_and_operators() {
        let replay = replay(
            &script(json!({
                "steps": [
                    { "op": "add_group", "ref": "g", "operator": "And" },
                    { "op": "add_condition", "parent": "g", "condition": { "operator": "Empty", "lhs_field": "a" } },
                    { "op": "set_group_operator", "target": "g", "operator": "Not" },
                    { "op": "set_group_operator", "target": "root", "operator": "Or" }
                ]
            })),
            LogicalOperator::And,
        )
        .unwrap();

        let payload = payload_json(&replay);
        assert_eq!(payload["Operator"], json!("Or"));
        assert_eq!(payload["Condition"][0]["Operator"], json!("Not"));
    }

    #[test]
    fn test_replay_records_skipped_steps() {
        let replay = replay(
            &script(json!({
                "steps": [
                    { "op": "add_group", "ref": "g", "operator": "Or" },
                    { "op": "remove", "target": "g" },
                    { "op": "remove", "target": "g" },
                    { "op": "add_condition", "parent": "g", "condition": { "operator": "Empty", "lhs_field": "a" } }
                ]
            })),
            LogicalOperator::And,
        )
        .unwrap();

        assert_eq!(replay.skipped, vec![2, 3]);
        assert!(replay.tree.payload().is_none());
    }

    #[test]
    fn test_replay_clear_and_root_operator() {
        let replay = replay(
            &script(json!({
                "steps": [
                    { "op": "add_condition", "condition": { "operator": "Empty", "lhs_field": "a" } },
                    { "op": "clear" },
                    { "op": "set_root_operator", "operator": "Or" },
                    { "op": "add_condition", "condition": { "operator": "Empty", "lhs_field": "b" } }
                ]
            })),
            LogicalOperator::And,
        )
        .unwrap();

        let payload: Filter = replay.tree.payload().unwrap();
        assert_eq!(payload.operator, LogicalOperator::Or);
        assert_eq!(payload.leaf_count(), 1);
    }

    #[test]
    fn test_unknown_ref_is_script_error() {
        let err = replay(
            &script(json!({ "steps": [ { "op": "remove", "target": "ghost" } ] })),
            LogicalOperator::And,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Script(_)));
        assert!(err.to_string().contains("unknown ref 'ghost'"));
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let parsed = serde_json::from_value::<Script>(json!({ "steps": [ { "op": "rename" } ] }));
        assert!(parsed.is_err());
    }
}
