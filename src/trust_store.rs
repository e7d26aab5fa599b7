//! Read-only trust store of enrolled identity keys.
//!
//! The store is a JSON document mapping key uuids to opaque records, either
//! flat or grouped under a device category:
//!
//! ```json
//! { "4f29e9ea-600a-11e7-8331-c70192ecfa55": { "name": "driver" } }
//! { "nfc": { "13126524-6256-11e7-be33-3f4e4481a8c9": {} } }
//! ```
//!
//! It is loaded once at startup. Changes on disk take effect on restart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigError;

/// Default trust store location.
pub const DEFAULT_TRUST_STORE_PATH: &str = "/etc/agl/keys.json";

/// Enrolled key uuids and their records.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    entries: HashMap<String, Value>,
    namespace: Option<String>,
    source: Option<PathBuf>,
}

impl TrustStore {
    /// Load and parse the trust store at `path`.
    ///
    /// With a `namespace`, only the object under that top-level key is used.
    /// A document without that key loads as an empty store.
    pub fn load(path: &Path, namespace: Option<&str>) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|e| ConfigError::TrustStoreUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let document: Value =
            serde_json::from_slice(&raw).map_err(|e| ConfigError::TrustStoreUnparseable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut store = Self::from_value(document, namespace).map_err(|message| {
            ConfigError::TrustStoreUnparseable {
                path: path.to_path_buf(),
                message,
            }
        })?;
        store.source = Some(path.to_path_buf());

        tracing::info!(
            "Loaded trust store {} ({} keys{})",
            path.display(),
            store.len(),
            namespace
                .map(|ns| format!(", namespace '{}'", ns))
                .unwrap_or_default()
        );
        Ok(store)
    }

    /// Build a store from an already parsed document.
    pub fn from_value(document: Value, namespace: Option<&str>) -> Result<Self, String> {
        let Value::Object(mut root) = document else {
            return Err("trust store root is not a JSON object".to_string());
        };

        let entries = match namespace {
            None => root.into_iter().collect(),
            Some(ns) => match root.remove(ns) {
                Some(Value::Object(inner)) => inner.into_iter().collect(),
                Some(_) => return Err(format!("namespace '{}' is not a JSON object", ns)),
                None => {
                    tracing::warn!("Trust store has no '{}' namespace; no key will match", ns);
                    HashMap::new()
                }
            },
        };

        Ok(Self {
            entries,
            namespace: namespace.map(str::to_string),
            source: None,
        })
    }

    /// Build a flat store from a list of uuids with empty records.
    pub fn from_uuids<I, S>(uuids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: uuids
                .into_iter()
                .map(|u| (u.into(), Value::Object(Default::default())))
                .collect(),
            namespace: None,
            source: None,
        }
    }

    /// Whether `uuid` is enrolled.
    pub fn contains(&self, uuid: &str) -> bool {
        self.entries.contains_key(uuid)
    }

    /// The record enrolled for `uuid`.
    pub fn get(&self, uuid: &str) -> Option<&Value> {
        self.entries.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// File the store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
