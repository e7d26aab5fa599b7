//! Credential verifier trait abstraction.
//!
//! A verifier turns the device node of a freshly plugged key into a
//! principal. The session manager holds one behind `Arc<dyn
//! CredentialVerifier>`; which backend it is gets decided at startup.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AuthError;

/// Result of verifying one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The device resolved to this principal.
    Resolved(String),
    /// The device was refused.
    Rejected(AuthError),
}

impl VerificationOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, VerificationOutcome::Resolved(_))
    }

    /// The resolved principal, if any.
    pub fn principal(&self) -> Option<&str> {
        match self {
            VerificationOutcome::Resolved(p) => Some(p),
            VerificationOutcome::Rejected(_) => None,
        }
    }

    pub fn into_result(self) -> Result<String, AuthError> {
        match self {
            VerificationOutcome::Resolved(p) => Ok(p),
            VerificationOutcome::Rejected(err) => Err(err),
        }
    }
}

impl From<Result<String, AuthError>> for VerificationOutcome {
    fn from(result: Result<String, AuthError>) -> Self {
        match result {
            Ok(principal) => VerificationOutcome::Resolved(principal),
            Err(err) => VerificationOutcome::Rejected(err),
        }
    }
}

/// Trait for resolving a device to a principal.
///
/// Implementations make at most one attempt per call and never retry.
/// Blocking work (device reads, stack calls) must not run on the async
/// worker threads.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify the key on `device`.
    async fn verify(&self, device: &Path) -> VerificationOutcome;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
