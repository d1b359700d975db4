use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands, ConfigCommands, ModeArg};
use commands::config::{self as config_cmd, load_config};
use commands::eval::EvalOptions;
use commands::filter::FilterOptions;
use commands::{CommandContext, CommandError};
use recordkit_query::expression::LogicalMode;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Parse errors surface from the commands that need the config.
    let config_color = load_config().ok().and_then(|config| config.output.color);
    let ctx = CommandContext::from_cli(&cli, config_color);
    logging::init_logging(ctx.verbose, ctx.quiet, ctx.use_colors);

    match run(&cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&cli, &e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn report_error(cli: &Cli, e: &CommandError) {
    if cli.json {
        let error_json = serde_json::json!({
            "error": {
                "code": e.code(),
                "message": e.to_string(),
            }
        });
        match serde_json::to_string_pretty(&error_json) {
            Ok(rendered) => eprintln!("{rendered}"),
            Err(_) => eprintln!("Error: {e}"),
        }
    } else {
        eprintln!("Error: {e}");
    }
}

fn run(cli: &Cli, ctx: &CommandContext) -> commands::Result<()> {
    debug!(command = ?cli.command, "dispatching");

    match &cli.command {
        Some(Commands::Eval {
            expr,
            values,
            user,
            mode,
            max_depth,
        }) => {
            let config = load_config()?;
            let opts = EvalOptions {
                expr: expr.clone(),
                values: values.clone(),
                user: user.clone(),
                mode: mode.map(logical_mode),
                max_depth: *max_depth,
            };
            commands::eval::execute(ctx, &opts, &config)
        }
        Some(Commands::Filter {
            script,
            request,
            validate,
        }) => {
            let config = load_config()?;
            let opts = FilterOptions {
                script: script.clone(),
                request: *request,
                validate: *validate,
            };
            commands::filter::execute(ctx, &opts, &config)
        }
        Some(Commands::Functions) => commands::functions::execute(ctx),
        Some(Commands::Config { command }) => dispatch_config(ctx, command),
        Some(Commands::Completions { shell }) => commands::completions::execute(shell).map_err(CommandError::Io),
        None => {
            if !ctx.quiet {
                println!("rk - recordkit CLI");
                println!("Use --help for usage information");
            }
            Ok(())
        }
    }
}

fn dispatch_config(ctx: &CommandContext, command: &Option<ConfigCommands>) -> commands::Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => config_cmd::execute_show(ctx),
        Some(ConfigCommands::Set { key, value }) => {
            let opts = config_cmd::ConfigSetOptions {
                key: key.clone(),
                value: value.clone(),
            };
            config_cmd::execute_set(ctx, &opts)
        }
        Some(ConfigCommands::Path) => config_cmd::execute_path(ctx),
    }
}

fn logical_mode(mode: ModeArg) -> LogicalMode {
    match mode {
        ModeArg::Eager => LogicalMode::Eager,
        ModeArg::ShortCircuit => LogicalMode::ShortCircuit,
    }
}
