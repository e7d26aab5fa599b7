//! Startup and configuration error types.
//!
//! These abort initialization: without a trust store no verification is
//! possible.

use std::fmt;
use std::path::PathBuf;

/// Configuration-specific error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The trust store document could not be read.
    TrustStoreUnreadable { path: PathBuf, message: String },

    /// The trust store document is not a JSON object.
    TrustStoreUnparseable { path: PathBuf, message: String },

    /// The config file could not be read.
    ConfigUnreadable { path: PathBuf, message: String },

    /// The config file is not valid JSON for `AuthConfig`.
    ConfigInvalid { path: PathBuf, message: String },

    /// An environment variable has an unusable value.
    InvalidValue { variable: String, message: String },
}

impl ConfigError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::TrustStoreUnreadable { path, .. } => {
                format!("Failed to read the key database '{}'.", path.display())
            }
            ConfigError::TrustStoreUnparseable { path, .. } => {
                format!("Failed to parse the key database '{}'.", path.display())
            }
            ConfigError::ConfigUnreadable { path, .. } => {
                format!("Failed to read config file '{}'.", path.display())
            }
            ConfigError::ConfigInvalid { path, .. } => {
                format!("Config file '{}' is invalid.", path.display())
            }
            ConfigError::InvalidValue { variable, .. } => {
                format!("Environment variable {} has an invalid value.", variable)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::TrustStoreUnreadable { .. } => "E_CFG_STORE_READ",
            ConfigError::TrustStoreUnparseable { .. } => "E_CFG_STORE_PARSE",
            ConfigError::ConfigUnreadable { .. } => "E_CFG_READ",
            ConfigError::ConfigInvalid { .. } => "E_CFG_INVALID",
            ConfigError::InvalidValue { .. } => "E_CFG_ENV",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TrustStoreUnreadable { path, message } => {
                write!(f, "Trust store '{}' unreadable: {}", path.display(), message)
            }
            ConfigError::TrustStoreUnparseable { path, message } => {
                write!(f, "Trust store '{}' unparseable: {}", path.display(), message)
            }
            ConfigError::ConfigUnreadable { path, message } => {
                write!(f, "Config '{}' unreadable: {}", path.display(), message)
            }
            ConfigError::ConfigInvalid { path, message } => {
                write!(f, "Config '{}' invalid: {}", path.display(), message)
            }
            ConfigError::InvalidValue { variable, message } => {
                write!(f, "Invalid value for {}: {}", variable, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
