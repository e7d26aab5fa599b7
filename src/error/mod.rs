//! Unified error handling for the authenticator.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Domain-specific Errors**: Auth, key file, device source and config errors
//! - **Unified Error Type**: `IdKeyError` consolidates all error types
//! - **Result Type Alias**: `IdKeyResult<T>` for consistent return types
//!
//! # Error Categories
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Auth | Key rejected by verification | No |
//! | Session | Conflicts with the open session | No |
//! | Key | Corrupt or foreign key file | No |
//! | Device | Event source hiccup | Yes |
//! | System | OS/filesystem errors | No |
//! | Configuration | Trust store or config issues | No |

mod auth;
mod category;
mod config;
mod device;
mod idkey_error;
mod key;
mod result;

pub use auth::AuthError;
pub use category::ErrorCategory;
pub use config::ConfigError;
pub use device::DeviceError;
pub use idkey_error::IdKeyError;
pub use key::{KeyFileError, KeyFileOp};
pub use result::IdKeyResult;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::path::PathBuf;

    /// Every domain error converts into the unified type and keeps its code.
    #[test]
    fn test_error_unification() {
        let auth_err: IdKeyError = AuthError::KeyNotFound {
            uuid: "abc".to_string(),
        }
        .into();
        let key_err: IdKeyError = KeyFileError::EmptyPayload.into();
        let dev_err: IdKeyError = DeviceError::SourceClosed.into();
        let cfg_err: IdKeyError = ConfigError::ConfigInvalid {
            path: PathBuf::from("/etc/idkey-auth/config.json"),
            message: "trailing comma".to_string(),
        }
        .into();

        assert_eq!(auth_err.category(), ErrorCategory::Auth);
        assert_eq!(key_err.category(), ErrorCategory::Key);
        assert_eq!(dev_err.category(), ErrorCategory::Device);
        assert_eq!(cfg_err.category(), ErrorCategory::Configuration);

        for err in [&auth_err, &key_err, &dev_err, &cfg_err] {
            assert!(err.error_code().starts_with("E_"));
            assert!(!err.user_message().is_empty());
            assert!(!err.recovery_hint().is_empty());
        }
    }

    /// Only transient device errors are worth retrying.
    #[test]
    fn test_retry_logic() {
        let retryable: IdKeyError = DeviceError::ReceiveFailed {
            message: "ENOBUFS".to_string(),
        }
        .into();
        assert!(retryable.is_retryable());

        let not_retryable: Vec<IdKeyError> = vec![
            AuthError::AlreadyLoggedIn.into(),
            AuthError::AuthenticateFailed {
                message: "denied".to_string(),
            }
            .into(),
            DeviceError::SourceClosed.into(),
            KeyFileError::TruncatedRead {
                expected: 12,
                actual: 3,
            }
            .into(),
        ];
        for err in not_retryable {
            assert!(!err.is_retryable(), "Expected {:?} to not be retryable", err);
        }
    }
}
