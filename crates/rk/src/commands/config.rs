//! Config command implementation.
//!
//! View and manage configuration settings.
//! Config file is located at ~/.config/rk/config.toml.

use std::env;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use recordkit_query::expression::{EvaluatorOptions, LogicalMode};
use recordkit_query::filter::LogicalOperator;
use serde::{Deserialize, Serialize};

use super::{CommandContext, CommandError, Result};

/// Current config file version. Increment when making breaking changes to schema.
const CONFIG_VERSION: u32 = 1;

/// Keys accepted by `rk config set`.
const VALID_KEYS: &str = "evaluator.max_depth, evaluator.logical_mode, filter.root_operator, output.color";

/// Configuration file structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version for migrations.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Evaluator settings.
    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    /// Filter editing settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            evaluator: EvaluatorConfig::default(),
            filter: FilterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Evaluator configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Maximum expression nesting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// `eager` or `short-circuit`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_mode: Option<LogicalMode>,
}

/// Filter configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Root operator for scripts that do not set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_operator: Option<LogicalOperator>,
}

/// Output configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl Config {
    /// Evaluator options with config values applied over the defaults.
    pub fn evaluator_options(&self) -> EvaluatorOptions {
        let defaults = EvaluatorOptions::default();
        EvaluatorOptions {
            max_depth: self.evaluator.max_depth.unwrap_or(defaults.max_depth),
            logical_mode: self.evaluator.logical_mode.unwrap_or(defaults.logical_mode),
        }
    }
}

/// Gets the config directory path.
/// Uses XDG-style paths: ~/.config/rk/ on all platforms.
fn get_config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("rk"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("rk"))
        .ok_or_else(|| CommandError::Config("Could not determine config directory".to_string()))
}

/// Gets the config file path. `RK_CONFIG` overrides the default location.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("RK_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    Ok(get_config_dir()?.join("config.toml"))
}

/// Loads the configuration from disk. A missing file yields the defaults.
pub fn load_config() -> Result<Config> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(&path).map_err(|e| CommandError::Config(format!("Failed to read config: {}", e)))?;

    let mut config: Config =
        toml::from_str(&content).map_err(|e| CommandError::Config(format!("Failed to parse config: {}", e)))?;

    config.version = CONFIG_VERSION;
    Ok(config)
}

/// Saves the configuration to disk.
fn save_config(config: &Config) -> Result<()> {
    let path = get_config_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CommandError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| CommandError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&path, content).map_err(|e| CommandError::Config(format!("Failed to write config: {}", e)))?;

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        use owo_colors::OwoColorize;

        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        let options = config.evaluator_options();
        println!("[evaluator]");
        println!("  max_depth: {}", options.max_depth);
        println!("  logical_mode: {}", options.logical_mode);

        println!("\n[filter]");
        println!(
            "  root_operator: {}",
            config.filter.root_operator.unwrap_or_default()
        );

        println!("\n[output]");
        println!("  color: {}", config.output.color.unwrap_or(true));
    }

    Ok(())
}

/// Options for the config set command.
pub struct ConfigSetOptions {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Executes the config set command.
pub fn execute_set(ctx: &CommandContext, opts: &ConfigSetOptions) -> Result<()> {
    let mut config = load_config()?;
    apply_setting(&mut config, &opts.key, &opts.value)?;
    save_config(&config)?;

    let path = get_config_path()?;
    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "key": opts.key,
            "value": opts.value,
            "path": path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Set {} = {}", opts.key, opts.value);
    }

    Ok(())
}

/// Writes one `section.field` setting into `config`.
fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key.split_once('.') {
        Some(("evaluator", "max_depth")) => {
            let depth = value
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| CommandError::Config(format!("Invalid max_depth '{}'. Use a positive integer", value)))?;
            config.evaluator.max_depth = Some(depth);
        }
        Some(("evaluator", "logical_mode")) => {
            let mode = value.parse::<LogicalMode>().map_err(CommandError::Config)?;
            config.evaluator.logical_mode = Some(mode);
        }
        Some(("filter", "root_operator")) => {
            config.filter.root_operator = Some(parse_root_operator(value)?);
        }
        Some(("output", "color")) => {
            config.output.color = Some(parse_bool(value)?);
        }
        _ => {
            return Err(CommandError::Config(format!(
                "Unknown config key '{}'. Valid keys: {}",
                key, VALID_KEYS
            )));
        }
    }
    Ok(())
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Parses a root operator name, ignoring case. `Not` is rejected because a
/// root NOT group only makes sense with exactly one child.
fn parse_root_operator(s: &str) -> Result<LogicalOperator> {
    match s.to_lowercase().as_str() {
        "and" => Ok(LogicalOperator::And),
        "or" => Ok(LogicalOperator::Or),
        _ => Err(CommandError::Config(format!(
            "Invalid root_operator value '{}'. Valid values: and, or",
            s
        ))),
    }
}

/// Parses a boolean value from string.
fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(CommandError::Config(format!(
            "Invalid boolean value '{}'. Use true/false, yes/no, 1/0, or on/off",
            s
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("ON").unwrap());
        assert!(!parse_bool("no").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.evaluator_options(), EvaluatorOptions::default());
        assert!(config.filter.root_operator.is_none());
        assert!(config.output.color.is_none());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
version = 1

[evaluator]
max_depth = 64
logical_mode = "short-circuit"

[filter]
root_operator = "Or"

[output]
color = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let options = config.evaluator_options();
        assert_eq!(options.max_depth, 64);
        assert_eq!(options.logical_mode, LogicalMode::ShortCircuit);
        assert_eq!(config.filter.root_operator, Some(LogicalOperator::Or));
        assert_eq!(config.output.color, Some(false));
    }

    #[test]
    fn test_config_deserialization_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.evaluator.max_depth.is_none());
    }

    #[test]
    fn test_config_serialization_skips_unset() {
        let mut config = Config::default();
        config.evaluator.logical_mode = Some(LogicalMode::Eager);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 1"));
        assert!(toml_str.contains("logical_mode = \"eager\""));
        assert!(!toml_str.contains("max_depth"));
    }

    #[test]
    fn test_apply_setting() {
        let mut config = Config::default();
        apply_setting(&mut config, "evaluator.max_depth", "32").unwrap();
        apply_setting(&mut config, "evaluator.logical_mode", "short-circuit").unwrap();
        apply_setting(&mut config, "filter.root_operator", "OR").unwrap();
        apply_setting(&mut config, "output.color", "off").unwrap();

        assert_eq!(config.evaluator.max_depth, Some(32));
        assert_eq!(config.evaluator.logical_mode, Some(LogicalMode::ShortCircuit));
        assert_eq!(config.filter.root_operator, Some(LogicalOperator::Or));
        assert_eq!(config.output.color, Some(false));
    }

    #[test]
    fn test_apply_setting_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply_setting(&mut config, "evaluator.max_depth", "0").is_err());
        assert!(apply_setting(&mut config, "evaluator.logical_mode", "lazy").is_err());
        assert!(apply_setting(&mut config, "filter.root_operator", "not").is_err());

        let err = apply_setting(&mut config, "token", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown config key 'token'"));
    }

    #[test]
    #[serial]
    fn test_set_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let original = env::var("RK_CONFIG").ok();
        env::set_var("RK_CONFIG", &config_path);

        let ctx = CommandContext {
            json_output: false,
            use_colors: false,
            quiet: true,
            verbose: false,
        };
        let result = execute_set(
            &ctx,
            &ConfigSetOptions {
                key: "evaluator.max_depth".to_string(),
                value: "48".to_string(),
            },
        )
        .and_then(|_| load_config());

        match original {
            Some(val) => env::set_var("RK_CONFIG", val),
            None => env::remove_var("RK_CONFIG"),
        }

        let config = result.unwrap();
        assert!(config_path.exists());
        assert_eq!(config.evaluator.max_depth, Some(48));
    }

    #[test]
    #[serial]
    fn test_missing_config_file_yields_defaults() {
        let original = env::var("RK_CONFIG").ok();
        env::set_var("RK_CONFIG", "/tmp/rk-test-nonexistent/config.toml");

        let result = load_config();

        match original {
            Some(val) => env::set_var("RK_CONFIG", val),
            None => env::remove_var("RK_CONFIG"),
        }

        assert_eq!(result.unwrap().evaluator_options(), EvaluatorOptions::default());
    }
}
