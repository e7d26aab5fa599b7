//! Authenticator configuration.
//!
//! Layered: built-in defaults, then the JSON config file (every field
//! optional), then `IDKEY_*` environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::dev_watcher::{DEFAULT_DEV_DIR, DEFAULT_SYS_BLOCK_DIR};
use crate::adapters::interactive_auth::DEFAULT_RULE;
use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::device_watcher::{ListenerConfig, DEFAULT_POLL_TIMEOUT};
use crate::error::ConfigError;
use crate::trust_store::DEFAULT_TRUST_STORE_PATH;

/// Which verifier resolves plugged keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Read the key and look its uuid up directly.
    #[default]
    TrustStore,
    /// Run an authentication stack transaction.
    InteractiveAuth,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::TrustStore => "trust-store",
            Backend::InteractiveAuth => "interactive-auth",
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trust-store" => Ok(Backend::TrustStore),
            "interactive-auth" => Ok(Backend::InteractiveAuth),
            other => Err(format!(
                "unknown backend '{}', expected 'trust-store' or 'interactive-auth'",
                other
            )),
        }
    }
}

/// Configuration for the authenticator daemon.
///
/// # Example
///
/// ```ignore
/// use idkey_auth::startup::{AuthConfig, Backend};
///
/// let config = AuthConfig::default()
///     .with_backend(Backend::InteractiveAuth)
///     .with_namespace("usb");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub backend: Backend,
    /// Trust store document
    pub trust_store: PathBuf,
    /// Top-level trust store key to read enrolled keys from
    pub namespace: Option<String>,
    /// Authentication stack rule (interactive backend only)
    pub rule: String,
    /// Directory watched for device nodes
    pub dev_dir: PathBuf,
    /// sysfs block class directory
    pub sys_block_dir: PathBuf,
    pub poll_timeout_secs: u64,
    pub bus_capacity: usize,
    /// tracing filter directive, e.g. `info` or `idkey_auth=debug`
    pub log: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            trust_store: PathBuf::from(DEFAULT_TRUST_STORE_PATH),
            namespace: None,
            rule: DEFAULT_RULE.to_string(),
            dev_dir: PathBuf::from(DEFAULT_DEV_DIR),
            sys_block_dir: PathBuf::from(DEFAULT_SYS_BLOCK_DIR),
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT.as_secs(),
            bus_capacity: DEFAULT_BUS_CAPACITY,
            log: None,
        }
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_trust_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust_store = path.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    pub fn with_dev_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dev_dir = dir.into();
        self
    }

    pub fn with_sys_block_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sys_block_dir = dir.into();
        self
    }

    pub fn with_poll_timeout_secs(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs.max(1))
    }

    /// Log filter directive: `RUST_LOG` when set, then the configured
    /// filter, then `info`.
    pub fn log_filter(&self) -> String {
        std::env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.log.clone())
            .unwrap_or_else(|| "info".to_string())
    }

    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            poll_timeout: self.poll_timeout(),
            ..ListenerConfig::default()
        }
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Resolve the full configuration.
    ///
    /// Reads `explicit` if given, otherwise the default config file when it
    /// exists, then applies the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    tracing::debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };
        base.apply_env()
    }

    /// Override fields from `IDKEY_*` variables.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(value) = env_var("IDKEY_BACKEND") {
            self.backend = value
                .parse()
                .map_err(|message| invalid("IDKEY_BACKEND", message))?;
        }
        if let Some(value) = env_var("IDKEY_TRUST_STORE") {
            self.trust_store = PathBuf::from(value);
        }
        if let Some(value) = env_var("IDKEY_NAMESPACE") {
            self.namespace = Some(value);
        }
        if let Some(value) = env_var("IDKEY_RULE") {
            self.rule = value;
        }
        if let Some(value) = env_var("IDKEY_DEV_DIR") {
            self.dev_dir = PathBuf::from(value);
        }
        if let Some(value) = env_var("IDKEY_POLL_TIMEOUT_SECS") {
            self.poll_timeout_secs = value.parse::<u64>().map_err(|e| {
                invalid("IDKEY_POLL_TIMEOUT_SECS", e.to_string())
            })?;
        }
        if let Some(value) = env_var("IDKEY_LOG") {
            self.log = Some(value);
        }
        Ok(self)
    }
}

/// `<config_dir>/idkey-auth/config.json`, when the platform has a config
/// directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("idkey-auth").join("config.json"))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn invalid(variable: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        variable: variable.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const VARS: [&str; 8] = [
        "IDKEY_BACKEND",
        "IDKEY_TRUST_STORE",
        "IDKEY_NAMESPACE",
        "IDKEY_RULE",
        "IDKEY_DEV_DIR",
        "IDKEY_POLL_TIMEOUT_SECS",
        "IDKEY_LOG",
        "RUST_LOG",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.backend, Backend::TrustStore);
        assert_eq!(config.trust_store, PathBuf::from("/etc/agl/keys.json"));
        assert_eq!(config.rule, "agl");
        assert_eq!(config.dev_dir, PathBuf::from("/dev"));
        assert_eq!(config.poll_timeout(), Duration::from_secs(5));
        assert_eq!(config.bus_capacity, 64);
        assert!(config.namespace.is_none());
    }

    #[test]
    fn test_builder() {
        let config = AuthConfig::new()
            .with_backend(Backend::InteractiveAuth)
            .with_namespace("nfc")
            .with_rule("login")
            .with_poll_timeout_secs(2);
        assert_eq!(config.backend, Backend::InteractiveAuth);
        assert_eq!(config.namespace.as_deref(), Some("nfc"));
        assert_eq!(config.rule, "login");
        assert_eq!(config.listener_config().poll_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_zero_poll_timeout_clamped() {
        let config = AuthConfig::new().with_poll_timeout_secs(0);
        assert_eq!(config.poll_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("trust-store".parse::<Backend>(), Ok(Backend::TrustStore));
        assert_eq!(
            "interactive-auth".parse::<Backend>(),
            Ok(Backend::InteractiveAuth)
        );
        assert!("pam".parse::<Backend>().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"backend":"interactive-auth","namespace":"usb"}"#,
        )
        .unwrap();

        let config = AuthConfig::from_file(&path).unwrap();
        assert_eq!(config.backend, Backend::InteractiveAuth);
        assert_eq!(config.namespace.as_deref(), Some("usb"));
        assert_eq!(config.rule, "agl");
    }

    #[test]
    fn test_from_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            AuthConfig::from_file(&dir.path().join("absent.json")),
            Err(ConfigError::ConfigUnreadable { .. })
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"backend":"nope"}"#).unwrap();
        assert!(matches!(
            AuthConfig::from_file(&path),
            Err(ConfigError::ConfigInvalid { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var("IDKEY_BACKEND", "interactive-auth");
        std::env::set_var("IDKEY_TRUST_STORE", "/tmp/keys.json");
        std::env::set_var("IDKEY_NAMESPACE", "nfc");
        std::env::set_var("IDKEY_POLL_TIMEOUT_SECS", "3");

        let config = AuthConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.backend, Backend::InteractiveAuth);
        assert_eq!(config.trust_store, PathBuf::from("/tmp/keys.json"));
        assert_eq!(config.namespace.as_deref(), Some("nfc"));
        assert_eq!(config.poll_timeout_secs, 3);
    }

    #[test]
    #[serial]
    fn test_log_filter_prefers_rust_log() {
        clear_env();
        std::env::set_var("IDKEY_LOG", "debug");
        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.log_filter(), "debug");

        std::env::set_var("RUST_LOG", "idkey_auth=trace");
        assert_eq!(config.log_filter(), "idkey_auth=trace");
        clear_env();

        assert_eq!(AuthConfig::default().log_filter(), "info");
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_values() {
        clear_env();
        std::env::set_var("IDKEY_POLL_TIMEOUT_SECS", "soon");
        let result = AuthConfig::from_env();
        clear_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        std::env::set_var("IDKEY_BACKEND", "pam");
        let result = AuthConfig::from_env();
        clear_env();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"rule":"from-file","namespace":"usb"}"#).unwrap();
        std::env::set_var("IDKEY_RULE", "from-env");

        let config = AuthConfig::load(Some(&path)).unwrap();
        clear_env();

        assert_eq!(config.rule, "from-env");
        assert_eq!(config.namespace.as_deref(), Some("usb"));
    }
}
