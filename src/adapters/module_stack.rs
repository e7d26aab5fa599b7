//! In-process authentication stack.
//!
//! A [`ModuleStack`] maps rule names to an ordered chain of
//! [`AuthModule`]s. Every module in the chain must succeed for the
//! transaction to succeed. Modules share a [`TransactionItems`] bag holding
//! the transaction environment, the resolved user and the auth token.
//!
//! [`IdKeyModule`] is the identity key module: it reads the key named by a
//! transaction variable, checks its uuid against a trust store and sets the
//! user to that uuid.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::adapters::trust_store_lookup::lookup_device;
use crate::traits::{AuthStack, AuthTransaction, StackError};
use crate::trust_store::TrustStore;

/// State shared by the modules of one transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionItems {
    pub rule: String,
    pub env: HashMap<String, String>,
    pub user: Option<String>,
    pub auth_token: Option<String>,
}

/// One link of a rule chain.
pub trait AuthModule: Send + Sync {
    fn name(&self) -> &str;

    /// Authenticate using and updating the transaction items.
    fn authenticate(&self, items: &mut TransactionItems) -> Result<(), StackError>;

    /// Validate the account after authentication.
    fn check_account(&self, _items: &TransactionItems) -> Result<(), StackError> {
        Ok(())
    }
}

/// Rule table of in-process modules.
#[derive(Default, Clone)]
pub struct ModuleStack {
    rules: HashMap<String, Vec<Arc<dyn AuthModule>>>,
}

impl ModuleStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `module` to the chain of `rule`.
    pub fn with_module(mut self, rule: impl Into<String>, module: Arc<dyn AuthModule>) -> Self {
        self.rules.entry(rule.into()).or_default().push(module);
        self
    }

    /// Stack with a single identity key module under `rule`.
    pub fn identity_key(rule: impl Into<String>, store: Arc<TrustStore>) -> Self {
        Self::new().with_module(rule, Arc::new(IdKeyModule::new(store, KeySource::device())))
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.rules.contains_key(rule)
    }
}

impl std::fmt::Debug for ModuleStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rules: Vec<_> = self.rules.keys().collect();
        rules.sort();
        f.debug_struct("ModuleStack").field("rules", &rules).finish()
    }
}

impl AuthStack for ModuleStack {
    fn start(&self, rule: &str) -> Result<Box<dyn AuthTransaction>, StackError> {
        let modules = self
            .rules
            .get(rule)
            .cloned()
            .ok_or_else(|| StackError::new(format!("no rule named '{}'", rule)))?;

        tracing::debug!("Started transaction for rule '{}' ({} modules)", rule, modules.len());
        Ok(Box::new(ModuleTransaction {
            items: TransactionItems {
                rule: rule.to_string(),
                ..Default::default()
            },
            modules,
            authenticated: false,
        }))
    }
}

struct ModuleTransaction {
    items: TransactionItems,
    modules: Vec<Arc<dyn AuthModule>>,
    authenticated: bool,
}

impl AuthTransaction for ModuleTransaction {
    fn put_env(&mut self, assignment: &str) -> Result<(), StackError> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| StackError::new(format!("malformed assignment '{}'", assignment)))?;
        if name.is_empty() {
            return Err(StackError::new("empty variable name"));
        }
        self.items.env.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn get_env(&self, name: &str) -> Option<String> {
        self.items.env.get(name).cloned()
    }

    fn authenticate(&mut self) -> Result<(), StackError> {
        if self.modules.is_empty() {
            return Err(StackError::new(format!(
                "rule '{}' has no modules",
                self.items.rule
            )));
        }
        for module in &self.modules {
            module.authenticate(&mut self.items).map_err(|e| {
                tracing::debug!("Module '{}' refused: {}", module.name(), e);
                e
            })?;
        }
        self.authenticated = true;
        Ok(())
    }

    fn check_account(&mut self) -> Result<(), StackError> {
        if !self.authenticated {
            return Err(StackError::new("account check before authentication"));
        }
        for module in &self.modules {
            module.check_account(&self.items)?;
        }
        Ok(())
    }

    fn principal(&self) -> Option<String> {
        self.items.user.clone()
    }

    fn end(self: Box<Self>) -> Result<(), StackError> {
        tracing::trace!("Ended transaction for rule '{}'", self.items.rule);
        Ok(())
    }
}

/// Where [`IdKeyModule`] finds the key identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// The variable holds a device path; the uuid is read from the key on it.
    Device { var: String },
    /// The variable holds the uuid itself, e.g. a tag id read by an NFC
    /// reader.
    UidEnv { var: String },
}

impl KeySource {
    /// Device path in `DEVICE`.
    pub fn device() -> Self {
        KeySource::Device {
            var: "DEVICE".to_string(),
        }
    }

    /// Tag id in `UID`.
    pub fn uid() -> Self {
        KeySource::UidEnv {
            var: "UID".to_string(),
        }
    }

    fn var(&self) -> &str {
        match self {
            KeySource::Device { var } | KeySource::UidEnv { var } => var,
        }
    }
}

/// Identity key module.
#[derive(Debug, Clone)]
pub struct IdKeyModule {
    store: Arc<TrustStore>,
    source: KeySource,
}

impl IdKeyModule {
    pub fn new(store: Arc<TrustStore>, source: KeySource) -> Self {
        Self { store, source }
    }
}

impl AuthModule for IdKeyModule {
    fn name(&self) -> &str {
        "idkey"
    }

    fn authenticate(&self, items: &mut TransactionItems) -> Result<(), StackError> {
        let var = self.source.var();
        let value = items
            .env
            .get(var)
            .cloned()
            .ok_or_else(|| StackError::new(format!("{} not set", var)))?;

        let uuid = match &self.source {
            KeySource::Device { .. } => lookup_device(&self.store, Path::new(&value))
                .map_err(|e| StackError::new(e.to_string()))?,
            KeySource::UidEnv { .. } => {
                if !self.store.contains(&value) {
                    return Err(StackError::new(format!("key {} is not enrolled", value)));
                }
                value
            }
        };

        if items.auth_token.is_none() {
            items.auth_token = Some(uuid.clone());
        }
        items.user = Some(uuid);
        Ok(())
    }
}
