//! Authentication and session error types.
//!
//! Every way a login or logout attempt can be refused maps to exactly one
//! variant here. The `Display` text is what goes out in `failed` events.

use std::fmt;
use std::path::PathBuf;

use super::key::KeyFileError;

/// Reasons a login/logout attempt or a verification was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A session is already open.
    AlreadyLoggedIn,

    /// The unplugged device is not the one that opened the session.
    DeviceMismatch { device: PathBuf },

    /// The session is empty.
    NoActiveSession,

    /// The authentication stack refused to open a transaction.
    StackStartFailed { message: String },

    /// The device variable could not be set in the transaction environment.
    EnvInjectFailed { message: String },

    /// The stack's authenticate step failed.
    AuthenticateFailed { message: String },

    /// The stack's account validity step failed.
    AccountInvalid { message: String },

    /// The stack succeeded but resolved no principal.
    NoPrincipalResolved,

    /// Closing the transaction failed.
    StackCloseFailed { message: String },

    /// The key file could not be read or is malformed.
    KeyFile(KeyFileError),

    /// The key payload is not a JSON object.
    BadPayload { message: String },

    /// The key payload has no string `uuid` field.
    MissingUuid,

    /// The key's uuid is not in the trust store.
    KeyNotFound { uuid: String },

    /// The verification task panicked or was cancelled before answering.
    VerifierAborted { message: String },
}

impl AuthError {
    pub(crate) fn aborted(err: tokio::task::JoinError) -> Self {
        AuthError::VerifierAborted {
            message: err.to_string(),
        }
    }

    /// True for rejections caused by the session state rather than the key.
    pub fn is_session_conflict(&self) -> bool {
        matches!(
            self,
            AuthError::AlreadyLoggedIn
                | AuthError::DeviceMismatch { .. }
                | AuthError::NoActiveSession
        )
    }

    /// True for rejections raised by the interactive authentication stack.
    pub fn is_stack_failure(&self) -> bool {
        matches!(
            self,
            AuthError::StackStartFailed { .. }
                | AuthError::EnvInjectFailed { .. }
                | AuthError::AuthenticateFailed { .. }
                | AuthError::AccountInvalid { .. }
                | AuthError::NoPrincipalResolved
                | AuthError::StackCloseFailed { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::AlreadyLoggedIn => {
                "The current user must be logged out first!".to_string()
            }
            AuthError::DeviceMismatch { .. } => {
                "The unplugged device wasn't the session key!".to_string()
            }
            AuthError::NoActiveSession => "There is no logged user!".to_string(),
            AuthError::StackStartFailed { .. } => "Authentication start failed!".to_string(),
            AuthError::EnvInjectFailed { .. } => {
                "Could not pass the device to the authentication stack!".to_string()
            }
            AuthError::AuthenticateFailed { .. } => "Authentication failed!".to_string(),
            AuthError::AccountInvalid { .. } => "Account is not valid!".to_string(),
            AuthError::NoPrincipalResolved => {
                "No user provided by the authentication stack!".to_string()
            }
            AuthError::StackCloseFailed { .. } => "Authentication end failed!".to_string(),
            AuthError::KeyFile(err) => err.user_message(),
            AuthError::BadPayload { .. } => "Failed to parse the key data!".to_string(),
            AuthError::MissingUuid => "The key does not contain a valid uuid!".to_string(),
            AuthError::KeyNotFound { .. } => "Key not found!".to_string(),
            AuthError::VerifierAborted { .. } => {
                "Internal error while checking the key!".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::AlreadyLoggedIn => "E_AUTH_ALREADY_LOGGED_IN",
            AuthError::DeviceMismatch { .. } => "E_AUTH_DEVICE_MISMATCH",
            AuthError::NoActiveSession => "E_AUTH_NO_SESSION",
            AuthError::StackStartFailed { .. } => "E_AUTH_STACK_START",
            AuthError::EnvInjectFailed { .. } => "E_AUTH_ENV_INJECT",
            AuthError::AuthenticateFailed { .. } => "E_AUTH_AUTHENTICATE",
            AuthError::AccountInvalid { .. } => "E_AUTH_ACCOUNT",
            AuthError::NoPrincipalResolved => "E_AUTH_NO_PRINCIPAL",
            AuthError::StackCloseFailed { .. } => "E_AUTH_STACK_CLOSE",
            AuthError::KeyFile(err) => err.error_code(),
            AuthError::BadPayload { .. } => "E_AUTH_BAD_PAYLOAD",
            AuthError::MissingUuid => "E_AUTH_MISSING_UUID",
            AuthError::KeyNotFound { .. } => "E_AUTH_KEY_NOT_FOUND",
            AuthError::VerifierAborted { .. } => "E_AUTH_ABORTED",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::AlreadyLoggedIn => {
                write!(f, "Current user must be logged out first")
            }
            AuthError::DeviceMismatch { device } => write!(
                f,
                "Unplugged device '{}' wasn't the session key",
                device.display()
            ),
            AuthError::NoActiveSession => write!(f, "There is no logged user"),
            AuthError::StackStartFailed { message } => {
                write!(f, "Authentication stack start failed: {}", message)
            }
            AuthError::EnvInjectFailed { message } => {
                write!(f, "Authentication stack putenv failed: {}", message)
            }
            AuthError::AuthenticateFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            AuthError::AccountInvalid { message } => {
                write!(f, "Account validation failed: {}", message)
            }
            AuthError::NoPrincipalResolved => {
                write!(f, "No user provided by the authentication stack")
            }
            AuthError::StackCloseFailed { message } => {
                write!(f, "Authentication stack end failed: {}", message)
            }
            AuthError::KeyFile(err) => write!(f, "{}", err),
            AuthError::BadPayload { message } => {
                write!(f, "Failed to parse key payload: {}", message)
            }
            AuthError::MissingUuid => write!(f, "Key payload does not contain a uuid"),
            AuthError::KeyNotFound { uuid } => {
                write!(f, "Key '{}' not found in trust store", uuid)
            }
            AuthError::VerifierAborted { message } => {
                write!(f, "Verification task aborted: {}", message)
            }
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::KeyFile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KeyFileError> for AuthError {
    fn from(err: KeyFileError) -> Self {
        AuthError::KeyFile(err)
    }
}
