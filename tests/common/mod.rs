//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let fixture = KeyFixture::new(&[ENROLLED_UUID]);
//! let device = fixture.key_device("sdb", ENROLLED_UUID);
//! let (tx, authenticator) = fixture.start(Backend::TrustStore);
//! tx.send(Ok(RawDeviceEvent::disk_added(&device))).await?;
//! ```

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use idkey_auth::adapters::{ChannelSource, DeviceEventSender};
use idkey_auth::bus::{AuthNotification, Subscription};
use idkey_auth::keyfile::write_key_file;
use idkey_auth::startup::{AuthConfig, Authenticator, Backend};

pub const ENROLLED_UUID: &str = "4f29e9ea-600a-11e7-8331-c70192ecfa55";
pub const OTHER_ENROLLED_UUID: &str = "13126524-6256-11e7-be33-3f4e4481a8c9";
pub const UNKNOWN_UUID: &str = "00000000-0000-4000-8000-000000000000";

/// Temporary trust store plus fake key devices.
pub struct KeyFixture {
    pub dir: TempDir,
    pub trust_store: PathBuf,
}

impl KeyFixture {
    /// Flat trust store enrolling `uuids`.
    pub fn new(uuids: &[&str]) -> Self {
        let entries: serde_json::Map<String, serde_json::Value> = uuids
            .iter()
            .map(|u| (u.to_string(), serde_json::json!({ "name": "test" })))
            .collect();
        Self::with_document(serde_json::Value::Object(entries))
    }

    pub fn with_document(document: serde_json::Value) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let trust_store = dir.path().join("keys.json");
        std::fs::write(&trust_store, document.to_string()).expect("write trust store");
        Self { dir, trust_store }
    }

    /// A fake device node holding a key for `uuid`.
    pub fn key_device(&self, name: &str, uuid: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let payload = serde_json::json!({ "uuid": uuid }).to_string();
        write_key_file(&path, payload.as_bytes()).expect("write key");
        path
    }

    /// A fake device node with arbitrary content.
    pub fn raw_device(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write device");
        path
    }

    pub fn config(&self, backend: Backend) -> AuthConfig {
        AuthConfig::new()
            .with_backend(backend)
            .with_trust_store(&self.trust_store)
            .with_poll_timeout_secs(1)
    }

    /// Start an authenticator fed through a channel.
    pub fn start(&self, backend: Backend) -> (DeviceEventSender, Authenticator) {
        self.start_with_config(self.config(backend))
    }

    pub fn start_with_config(&self, config: AuthConfig) -> (DeviceEventSender, Authenticator) {
        let (tx, source) = ChannelSource::new(16);
        let authenticator =
            Authenticator::start_with_source(config, Box::new(source)).expect("start");
        (tx, authenticator)
    }
}

/// Next notification, failing the test after a few seconds.
pub async fn next_notification(sub: &mut Subscription) -> AuthNotification {
    tokio::time::timeout(Duration::from_secs(5), sub.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("bus closed")
}
