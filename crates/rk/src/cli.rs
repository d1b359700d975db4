//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the rk CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// rk - inspect recordkit filters and formulas from the terminal
#[derive(Parser, Debug)]
#[command(name = "rk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate an expression tree
    #[command(alias = "e")]
    Eval {
        /// Expression JSON file ("-" for stdin)
        expr: PathBuf,

        /// JSON object of form values
        #[arg(long)]
        values: Option<PathBuf>,

        /// JSON object exposed as CURRENT_USER
        #[arg(long)]
        user: Option<PathBuf>,

        /// How AND/OR evaluate their arguments (default: from config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Maximum expression nesting (default: from config)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Replay a filter edit script and print the payload
    #[command(alias = "f")]
    Filter {
        /// Edit script JSON file ("-" for stdin)
        script: PathBuf,

        /// Wrap the payload in a request body
        #[arg(long, value_enum)]
        request: Option<RequestKind>,

        /// Fail if the final tree has validation issues
        #[arg(long)]
        validate: bool,
    },

    /// List available functions
    Functions,

    /// View and edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Logical evaluation mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Eager,
    ShortCircuit,
}

/// Request body to wrap a filter payload in
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    List,
    Count,
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Print config file path
    Path,
}
