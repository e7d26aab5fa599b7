//! Error category classification for unified error handling.
//!
//! Categories group the domain errors so callers can pick a reaction
//! (re-plug the key, fix the trust store, wait for the device source)
//! without matching every variant.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential verification rejected the key.
    Auth,

    /// The request conflicts with the current session state.
    Session,

    /// The identity key file is missing, corrupt or unreadable.
    Key,

    /// The hotplug event source failed to deliver an event.
    /// Transient; the listener keeps polling.
    Device,

    /// System/OS errors (filesystem, permissions).
    System,

    /// Configuration errors (missing or invalid trust store, bad config file).
    /// Not retryable until the configuration is corrected.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Device)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "auth",
            ErrorCategory::Session => "session",
            ErrorCategory::Key => "key",
            ErrorCategory::Device => "device",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns a user-friendly description of the category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "Authentication problem",
            ErrorCategory::Session => "Session state conflict",
            ErrorCategory::Key => "Identity key problem",
            ErrorCategory::Device => "Device event source issue",
            ErrorCategory::System => "System error",
            ErrorCategory::Configuration => "Configuration problem",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Auth => "Make sure the key is enrolled in the trust store",
            ErrorCategory::Session => "Unplug the current session key first",
            ErrorCategory::Key => "Re-provision the identity key and plug it in again",
            ErrorCategory::Device => "The device watcher will keep retrying",
            ErrorCategory::System => "Check device permissions",
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
