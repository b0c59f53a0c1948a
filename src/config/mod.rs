//! Configuration file loading and parsing.
//!
//! The command-line tool reads an optional JSON file holding the
//! fabrication parameters of the technology and the logging settings.
//!
//! # Configuration File Locations
//!
//! 1. Path specified via `--config` CLI flag
//! 2. Default location:
//!    - **Linux/macOS:** `~/.lnoi400-pdk/config.json`
//!    - **Windows:** `%USERPROFILE%\.lnoi400-pdk\config.json`
//!
//! A missing default file is not an error: [`load_config_or_default`]
//! falls back to the process defaults.
//!
//! # Example Configuration
//!
//! ```json
//! {
//!     "technology": { "include_substrate": true },
//!     "logging": { "level": "info" }
//! }
//! ```

mod settings;

pub use settings::{Config, LoggingConfig, OutputConfig};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

/// Returns the default configuration directory.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".lnoi400-pdk"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - A technology parameter is out of range
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path().ok_or_else(|| ConfigError::NotFound {
            path: PathBuf::from("<default config path>"),
        })?,
    };

    if !config_path.exists() {
        return Err(ConfigError::NotFound { path: config_path });
    }

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    config.validate()?;
    debug!(path = %config_path.display(), "loaded configuration");

    Ok(config)
}

/// Loads the configuration, using the defaults when no file was requested
/// and none exists at the default location.
///
/// # Errors
///
/// Same as [`load_config`], except that a missing default file is not an
/// error. A missing explicit `path` still is.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match load_config(path) {
        Err(ConfigError::NotFound { .. }) if path.is_none() => Ok(Config::default()),
        result => result,
    }
}
