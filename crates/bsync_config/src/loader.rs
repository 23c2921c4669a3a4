//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::exclusions::LibraryExclusions;
use crate::types::SyncConfig;
use std::path::Path;

/// Name of the configuration file inside a workspace.
pub const CONFIG_FILE_NAME: &str = "bsync.toml";

/// Loads and validates `bsync.toml` from a workspace directory.
pub fn load_config(workspace_dir: &Path) -> Result<SyncConfig, ConfigError> {
    let content = std::fs::read_to_string(workspace_dir.join(CONFIG_FILE_NAME))?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<SyncConfig, ConfigError> {
    let config: SyncConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SyncConfig) -> Result<(), ConfigError> {
    LibraryExclusions::compile(&config.java.exclude_library)?;
    for excluded in &config.project.exclude_directories {
        if !config.project.directories.iter().any(|d| d.is_ancestor_of(excluded)) {
            return Err(ConfigError::ValidationError(format!(
                "excluded directory '{excluded}' is not under any project directory"
            )));
        }
    }
    if config.sync.parallelism > 1024 {
        return Err(ConfigError::ValidationError(format!(
            "sync.parallelism = {} is out of range",
            config.sync.parallelism
        )));
    }
    Ok(())
}
