//! Eval command implementation.
//!
//! Decodes an expression tree and evaluates it against form values read
//! from a JSON file.

use std::path::PathBuf;

use owo_colors::OwoColorize;
use recordkit_query::expression::{
    EvaluationContext, Evaluator, ExpressionNode, FunctionRegistry, LogicalMode, SystemValueProvider, Value,
};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::config::Config;
use super::{read_json, CommandContext, Result};

/// Options for the eval command.
pub struct EvalOptions {
    /// Expression JSON file.
    pub expr: PathBuf,
    /// Form values JSON file.
    pub values: Option<PathBuf>,
    /// CURRENT_USER JSON file.
    pub user: Option<PathBuf>,
    /// Overrides the configured logical mode.
    pub mode: Option<LogicalMode>,
    /// Overrides the configured depth limit.
    pub max_depth: Option<usize>,
}

/// Executes the eval command.
pub fn execute(ctx: &CommandContext, opts: &EvalOptions, config: &Config) -> Result<()> {
    let expr: ExpressionNode = read_json(&opts.expr)?;

    let form: JsonValue = match &opts.values {
        Some(path) => read_json(path)?,
        None => JsonValue::Object(Default::default()),
    };
    if !form.is_object() {
        warn!("form values are not a JSON object and will be ignored");
    }

    let user = match &opts.user {
        Some(path) => Value::from(read_json::<JsonValue>(path)?),
        None => Value::Undefined,
    };

    let context = EvaluationContext::capture(form, &SystemValueProvider::new(user));

    let mut options = config.evaluator_options();
    if let Some(mode) = opts.mode {
        options.logical_mode = mode;
    }
    if let Some(max_depth) = opts.max_depth {
        options.max_depth = max_depth;
    }

    let registry = FunctionRegistry::builtin();
    debug!(
        nodes = expr.node_count(),
        mode = %options.logical_mode,
        max_depth = options.max_depth,
        "evaluating expression"
    );
    let value = Evaluator::with_options(&registry, options).evaluate(&expr, &context)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "result": value,
            "type": value.type_name(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        let rendered = render_value(&value);
        if ctx.use_colors {
            println!("{} {}", rendered, format!("({})", value.type_name()).dimmed());
        } else {
            println!("{} ({})", rendered, value.type_name());
        }
    }

    Ok(())
}

/// Renders a value for terminal output. Arrays and objects print as compact
/// JSON; everything else uses its string form.
fn render_value(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => JsonValue::from(value.clone()).to_string(),
        Value::String(s) => format!("{:?}", s),
        other => other.to_js_string(),
    }
}
