//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files. The file always
//! lives at `<config home>/config.toml`, where the config home is the
//! directory given on the command line or `~/.shortlink-client`.
//! `[paths] data_dir` moves the session database only, never the file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Shortlink Client Configuration
# Auto-generated - edit as needed

[api]
# Base URL of the shortening service
base_url = "http://localhost:3000"

# HTTP request timeout in seconds
timeout_secs = 30

[ui]
# How long "Copied!" stays visible after copying, in milliseconds
copy_feedback_ms = 2000

[paths]
# Directory for the session database (optional, defaults to ~/.shortlink-client)
# data_dir = "/custom/path"
"#;

/// Load configuration from `config_path` or fall back to defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    if config_path.exists() {
        load_config_from_file(config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Save configuration to `config_path`.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig, config_path: &Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(config_path, content).map_err(|e| {
        AppError::io(
            format!("Failed to write config file: {}", config_path.display()),
            e,
        )
    })?;

    tracing::info!(path = %config_path.display(), "Configuration saved");

    Ok(())
}

/// Create default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(())
}

/// Path of the configuration file under `config_home`, or under the
/// default data directory when none is given.
#[must_use]
pub fn config_file_path(config_home: Option<&Path>) -> PathBuf {
    config_home
        .map_or_else(AppConfig::default_data_dir, Path::to_path_buf)
        .join("config.toml")
}
