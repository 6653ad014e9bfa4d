use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PAPERFLOW_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "paperflow.json";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Resolves the config source: `$PAPERFLOW_CONFIG`, then `./paperflow.json`,
/// then built-in defaults. Returns the path that was loaded, if any.
pub fn discover_config() -> Result<(Config, Option<PathBuf>), ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        return load_config(&path).map(|config| (config, Some(path)));
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return load_config(&local).map(|config| (config, Some(local)));
    }

    Ok((Config::default(), None))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.ocr.language.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "ocr.language must not be empty".to_string(),
        });
    }

    if !(72..=1200).contains(&config.ocr.dpi) {
        return Err(ConfigError::Validation {
            message: format!("ocr.dpi must be between 72 and 1200, got {}", config.ocr.dpi),
        });
    }

    if config.primary.jobs == 0 {
        return Err(ConfigError::Validation {
            message: "primary.jobs must be at least 1".to_string(),
        });
    }

    let dirs = &config.directories;
    if dirs.input == dirs.output || dirs.input == dirs.processed || dirs.output == dirs.processed
    {
        return Err(ConfigError::Validation {
            message: "input, output and processed directories must be distinct".to_string(),
        });
    }

    Ok(())
}
