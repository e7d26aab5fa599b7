//! Assembled authenticator service.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::{AuthConfig, Backend};
use crate::adapters::{DevWatcherSource, InteractiveAuthVerifier, ModuleStack, TrustStoreVerifier};
use crate::bus::{EventBus, EventKind, Subscription};
use crate::device_watcher::{spawn_device_listener, ListenerExit};
use crate::error::{ConfigError, IdKeyResult};
use crate::session::SessionManager;
use crate::traits::{CredentialVerifier, DeviceEventSource};
use crate::trust_store::TrustStore;

/// A running authenticator: session, bus and device listener.
pub struct Authenticator {
    config: AuthConfig,
    session: Arc<SessionManager>,
    bus: EventBus,
    cancel: CancellationToken,
    listener: JoinHandle<ListenerExit>,
}

impl Authenticator {
    /// Load the trust store, watch the device directory and start
    /// listening. Must run inside a tokio runtime.
    ///
    /// A trust store that can't be read or parsed aborts startup.
    pub fn start(config: AuthConfig) -> IdKeyResult<Self> {
        let verifier = build_verifier(&config)?;
        let source = DevWatcherSource::new(&config.dev_dir, &config.sys_block_dir)?;
        Ok(Self::start_with(config, verifier, Box::new(source)))
    }

    /// Start with the configured verifier and a caller-supplied event source.
    pub fn start_with_source(
        config: AuthConfig,
        source: Box<dyn DeviceEventSource>,
    ) -> IdKeyResult<Self> {
        let verifier = build_verifier(&config)?;
        Ok(Self::start_with(config, verifier, source))
    }

    /// Start with every dependency supplied.
    pub fn start_with(
        config: AuthConfig,
        verifier: Arc<dyn CredentialVerifier>,
        source: Box<dyn DeviceEventSource>,
    ) -> Self {
        let bus = EventBus::new(config.bus_capacity);
        let session = Arc::new(SessionManager::new(verifier, bus.clone()));
        let cancel = CancellationToken::new();
        let listener = spawn_device_listener(
            source,
            Arc::clone(&session),
            config.listener_config(),
            cancel.clone(),
        );

        tracing::info!("Authenticator started ({} backend)", config.backend.as_str());
        Self {
            config,
            session,
            bus,
            cancel,
            listener,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self, kinds: &[EventKind]) -> Subscription {
        self.bus.subscribe(kinds)
    }

    /// Whether the listener task already stopped on its own.
    pub fn listener_finished(&self) -> bool {
        self.listener.is_finished()
    }

    /// Stop the listener and wait for it.
    pub async fn shutdown(self) -> Option<ListenerExit> {
        self.cancel.cancel();
        match self.listener.await {
            Ok(exit) => {
                tracing::info!("Authenticator stopped ({:?})", exit);
                Some(exit)
            }
            Err(e) => {
                tracing::error!("Device listener task failed: {}", e);
                None
            }
        }
    }
}

/// Load the trust store and build the configured verifier.
pub fn build_verifier(config: &AuthConfig) -> Result<Arc<dyn CredentialVerifier>, ConfigError> {
    let store = Arc::new(TrustStore::load(
        &config.trust_store,
        config.namespace.as_deref(),
    )?);

    let verifier: Arc<dyn CredentialVerifier> = match config.backend {
        Backend::TrustStore => Arc::new(TrustStoreVerifier::new(store)),
        Backend::InteractiveAuth => {
            let stack = ModuleStack::identity_key(config.rule.clone(), store);
            Arc::new(InteractiveAuthVerifier::new(Arc::new(stack)).with_rule(config.rule.clone()))
        }
    };
    Ok(verifier)
}
