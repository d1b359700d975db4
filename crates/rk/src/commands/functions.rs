//! Functions command implementation.

use recordkit_query::expression::FunctionRegistry;

use super::{CommandContext, Result};

/// Lists the built-in function names in sorted order.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let registry = FunctionRegistry::builtin();
    let names: Vec<&str> = registry.names().collect();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else if !ctx.quiet {
        for name in names {
            println!("{}", name);
        }
    }

    Ok(())
}
