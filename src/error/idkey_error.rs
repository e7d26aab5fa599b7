//! Unified error type for the authenticator.
//!
//! `IdKeyError` wraps the domain-specific error enums so startup code and
//! the binary can propagate any of them with `?`.

use std::fmt;

use super::auth::AuthError;
use super::category::ErrorCategory;
use super::config::ConfigError;
use super::device::DeviceError;
use super::key::KeyFileError;

/// Unified error type for the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKeyError {
    /// Verification or session errors.
    Auth(AuthError),

    /// Key file codec errors.
    Key(KeyFileError),

    /// Device event source errors.
    Device(DeviceError),

    /// Startup/configuration errors.
    Config(ConfigError),
}

impl IdKeyError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            IdKeyError::Auth(err) => {
                if err.is_session_conflict() {
                    ErrorCategory::Session
                } else if let AuthError::KeyFile(KeyFileError::Io { .. })
                | AuthError::VerifierAborted { .. } = err
                {
                    ErrorCategory::System
                } else if let AuthError::KeyFile(_) = err {
                    ErrorCategory::Key
                } else {
                    ErrorCategory::Auth
                }
            }
            IdKeyError::Key(KeyFileError::Io { .. }) => ErrorCategory::System,
            IdKeyError::Key(_) => ErrorCategory::Key,
            IdKeyError::Device(_) => ErrorCategory::Device,
            IdKeyError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            IdKeyError::Device(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            IdKeyError::Auth(err) => err.user_message(),
            IdKeyError::Key(err) => err.user_message(),
            IdKeyError::Device(err) => err.user_message(),
            IdKeyError::Config(err) => err.user_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            IdKeyError::Auth(err) => err.error_code(),
            IdKeyError::Key(err) => err.error_code(),
            IdKeyError::Device(err) => err.error_code(),
            IdKeyError::Config(err) => err.error_code(),
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for IdKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdKeyError::Auth(err) => write!(f, "{}", err),
            IdKeyError::Key(err) => write!(f, "{}", err),
            IdKeyError::Device(err) => write!(f, "{}", err),
            IdKeyError::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IdKeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdKeyError::Auth(err) => Some(err),
            IdKeyError::Key(err) => Some(err),
            IdKeyError::Device(err) => Some(err),
            IdKeyError::Config(err) => Some(err),
        }
    }
}

impl From<AuthError> for IdKeyError {
    fn from(err: AuthError) -> Self {
        IdKeyError::Auth(err)
    }
}

impl From<KeyFileError> for IdKeyError {
    fn from(err: KeyFileError) -> Self {
        IdKeyError::Key(err)
    }
}

impl From<DeviceError> for IdKeyError {
    fn from(err: DeviceError) -> Self {
        IdKeyError::Device(err)
    }
}

impl From<ConfigError> for IdKeyError {
    fn from(err: ConfigError) -> Self {
        IdKeyError::Config(err)
    }
}
