//! Verifier that reads the key file directly and checks the trust store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::keyfile::read_key_file;
use crate::traits::{CredentialVerifier, VerificationOutcome};
use crate::trust_store::TrustStore;

/// Resolves a device by reading its key file and looking the uuid up in a
/// [`TrustStore`]. The principal is the uuid.
#[derive(Debug, Clone)]
pub struct TrustStoreVerifier {
    store: Arc<TrustStore>,
}

impl TrustStoreVerifier {
    pub fn new(store: Arc<TrustStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TrustStore {
        &self.store
    }
}

#[async_trait]
impl CredentialVerifier for TrustStoreVerifier {
    async fn verify(&self, device: &Path) -> VerificationOutcome {
        let store = Arc::clone(&self.store);
        let device = device.to_path_buf();

        tokio::task::spawn_blocking(move || lookup_device(&store, &device))
            .await
            .unwrap_or_else(|join_err| {
                tracing::error!("Key lookup task aborted: {}", join_err);
                Err(AuthError::aborted(join_err))
            })
            .into()
    }

    fn name(&self) -> &'static str {
        "trust-store"
    }
}

/// Read the key on `device` and return its uuid if `store` enrolls it.
///
/// Blocking.
pub fn lookup_device(store: &TrustStore, device: &Path) -> Result<String, AuthError> {
    let key = read_key_file(device).map_err(|e| {
        tracing::warn!("Can't read key on {}: {}", device.display(), e);
        AuthError::from(e)
    })?;

    let uuid = key.uuid().map_err(|e| {
        tracing::warn!("Bad key payload on {}: {}", device.display(), e);
        e
    })?;

    if store.contains(&uuid) {
        tracing::debug!("Key {} on {} is enrolled", uuid, device.display());
        Ok(uuid)
    } else {
        tracing::warn!("Key {} on {} is not enrolled", uuid, device.display());
        Err(AuthError::KeyNotFound { uuid })
    }
}
