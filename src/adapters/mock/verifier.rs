//! Scripted credential verifier for testing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::traits::{CredentialVerifier, VerificationOutcome};

/// Verifier returning configured outcomes and recording every call.
///
/// Per-device outcomes take precedence over the default outcome.
///
/// # Example
///
/// ```ignore
/// let verifier = MockVerifier::resolving("alice");
/// verifier.set_device_outcome("/dev/sdc", VerificationOutcome::Rejected(AuthError::MissingUuid));
///
/// assert!(verifier.verify(Path::new("/dev/sdb")).await.is_resolved());
/// assert!(!verifier.verify(Path::new("/dev/sdc")).await.is_resolved());
/// assert_eq!(verifier.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockVerifier {
    default_outcome: Arc<Mutex<VerificationOutcome>>,
    per_device: Arc<Mutex<HashMap<PathBuf, VerificationOutcome>>>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl MockVerifier {
    fn with_outcome(outcome: VerificationOutcome) -> Self {
        Self {
            default_outcome: Arc::new(Mutex::new(outcome)),
            per_device: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    /// Resolve every device to `principal`.
    pub fn resolving(principal: impl Into<String>) -> Self {
        Self::with_outcome(VerificationOutcome::Resolved(principal.into()))
    }

    /// Reject every device with `err`.
    pub fn rejecting(err: AuthError) -> Self {
        Self::with_outcome(VerificationOutcome::Rejected(err))
    }

    pub fn set_outcome(&self, outcome: VerificationOutcome) {
        *self.default_outcome.lock().unwrap() = outcome;
    }

    /// Outcome for one specific device.
    pub fn set_device_outcome(&self, device: impl Into<PathBuf>, outcome: VerificationOutcome) {
        self.per_device
            .lock()
            .unwrap()
            .insert(device.into(), outcome);
    }

    /// Sleep this long inside every verify call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Devices verified so far, in call order.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialVerifier for MockVerifier {
    async fn verify(&self, device: &Path) -> VerificationOutcome {
        self.calls.lock().unwrap().push(device.to_path_buf());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = self.per_device.lock().unwrap().get(device) {
            return outcome.clone();
        }
        self.default_outcome.lock().unwrap().clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
