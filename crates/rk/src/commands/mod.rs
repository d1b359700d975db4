//! Command implementations for the rk CLI.

pub mod completions;
pub mod config;
pub mod eval;
pub mod filter;
pub mod functions;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use recordkit_query::expression::EvaluationError;
use serde::de::DeserializeOwned;

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Expression evaluation error.
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Filter script could not be replayed or failed validation.
    #[error("filter script error: {0}")]
    Script(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Returns the error code string for JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::Evaluation(_) => "EVALUATION_ERROR",
            CommandError::Script(_) => "SCRIPT_ERROR",
            CommandError::Config(_) => "CONFIG_ERROR",
            CommandError::Io(_) => "IO_ERROR",
            CommandError::Json(_) => "JSON_ERROR",
        }
    }

    /// Returns the process exit code for the error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::Evaluation(_) => 1,
            CommandError::Script(_) => 1,
            CommandError::Json(_) => 1,
            CommandError::Io(_) => 3,
            CommandError::Config(_) => 5,
        }
    }
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Context for command execution, containing common dependencies.
pub struct CommandContext {
    /// Whether to output JSON.
    pub json_output: bool,
    /// Whether to use colors.
    pub use_colors: bool,
    /// Whether to be quiet (errors only).
    pub quiet: bool,
    /// Whether to be verbose.
    pub verbose: bool,
}

impl CommandContext {
    /// Creates a new command context from CLI arguments.
    ///
    /// Colors are on unless `--no-color` is given, `NO_COLOR` is set, or the
    /// config file turns them off.
    pub fn from_cli(cli: &Cli, config_color: Option<bool>) -> Self {
        let no_color_env = std::env::var_os("NO_COLOR").is_some();
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color && !no_color_env && config_color.unwrap_or(true),
            quiet: cli.quiet,
            verbose: cli.verbose,
        }
    }
}

/// Reads and decodes a JSON document from a file, or stdin for `-`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&content)?)
}
