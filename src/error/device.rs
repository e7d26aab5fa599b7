//! Device event source error types.

use std::fmt;
use std::path::PathBuf;

/// Errors surfaced by a device event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Receiving the next notification failed. The listener logs it and
    /// keeps polling.
    ReceiveFailed { message: String },

    /// The source can never deliver another event.
    SourceClosed,

    /// Setting up the watch on the device directory failed.
    WatchFailed { path: PathBuf, message: String },
}

impl DeviceError {
    /// Check if polling may succeed again after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, DeviceError::ReceiveFailed { .. })
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            DeviceError::ReceiveFailed { .. } => {
                "Failed to receive a device event.".to_string()
            }
            DeviceError::SourceClosed => "The device event source stopped.".to_string(),
            DeviceError::WatchFailed { path, .. } => {
                format!("Cannot watch '{}' for devices.", path.display())
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            DeviceError::ReceiveFailed { .. } => "E_DEV_RECEIVE",
            DeviceError::SourceClosed => "E_DEV_CLOSED",
            DeviceError::WatchFailed { .. } => "E_DEV_WATCH",
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::ReceiveFailed { message } => {
                write!(f, "Device event receive failed: {}", message)
            }
            DeviceError::SourceClosed => write!(f, "Device event source closed"),
            DeviceError::WatchFailed { path, message } => {
                write!(f, "Failed to watch '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<notify::Error> for DeviceError {
    fn from(err: notify::Error) -> Self {
        DeviceError::ReceiveFailed {
            message: err.to_string(),
        }
    }
}
