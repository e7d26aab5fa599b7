//! Verifier backed by an interactive authentication stack transaction.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::traits::{
    env_assignment, AuthStack, AuthTransaction, CredentialVerifier, VerificationOutcome,
};

/// Rule name the transaction is opened for.
pub const DEFAULT_RULE: &str = "agl";

/// Transaction variable carrying the candidate device path.
pub const DEVICE_ENV_VAR: &str = "DEVICE";

/// Resolves a device by running one authentication stack transaction.
///
/// The device path is handed to the stack through the transaction
/// environment, never through the process environment. The principal comes
/// from the stack.
pub struct InteractiveAuthVerifier {
    stack: Arc<dyn AuthStack>,
    rule: String,
    env_var: String,
}

impl InteractiveAuthVerifier {
    pub fn new(stack: Arc<dyn AuthStack>) -> Self {
        Self {
            stack,
            rule: DEFAULT_RULE.to_string(),
            env_var: DEVICE_ENV_VAR.to_string(),
        }
    }

    /// Use a different rule name.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = rule.into();
        self
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }
}

#[async_trait]
impl CredentialVerifier for InteractiveAuthVerifier {
    async fn verify(&self, device: &Path) -> VerificationOutcome {
        let stack = Arc::clone(&self.stack);
        let rule = self.rule.clone();
        let env_var = self.env_var.clone();
        let device = device.to_path_buf();

        let result = tokio::task::spawn_blocking(move || {
            run_transaction(stack.as_ref(), &rule, &env_var, &device)
        })
        .await
        .unwrap_or_else(|join_err| {
            tracing::error!("Authentication task aborted: {}", join_err);
            Err(AuthError::aborted(join_err))
        });

        result.into()
    }

    fn name(&self) -> &'static str {
        "interactive-auth"
    }
}

/// Run one full transaction: start, inject, authenticate, validate, read
/// the principal, end.
///
/// The transaction is ended on every path once started. A failing end is
/// reported only when nothing failed before it.
pub fn run_transaction(
    stack: &dyn AuthStack,
    rule: &str,
    env_var: &str,
    device: &Path,
) -> Result<String, AuthError> {
    let mut transaction = stack.start(rule).map_err(|e| {
        tracing::error!("Authentication stack start failed for rule '{}': {}", rule, e);
        AuthError::StackStartFailed { message: e.message }
    })?;

    let staged = run_stages(transaction.as_mut(), env_var, device);
    let closed = transaction.end();

    match (staged, closed) {
        (Ok(principal), Ok(())) => Ok(principal),
        (Ok(_), Err(e)) => {
            tracing::error!("Authentication stack end failed: {}", e);
            Err(AuthError::StackCloseFailed { message: e.message })
        }
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!("Authentication stack end also failed: {}", close_err);
            Err(err)
        }
    }
}

fn run_stages(
    transaction: &mut dyn AuthTransaction,
    env_var: &str,
    device: &Path,
) -> Result<String, AuthError> {
    let assignment = env_assignment(env_var, &device.to_string_lossy());
    transaction.put_env(&assignment).map_err(|e| {
        tracing::error!("Authentication stack putenv failed: {}", e);
        AuthError::EnvInjectFailed { message: e.message }
    })?;

    transaction.authenticate().map_err(|e| {
        tracing::warn!("Authentication failed for {}: {}", device.display(), e);
        AuthError::AuthenticateFailed { message: e.message }
    })?;

    transaction.check_account().map_err(|e| {
        tracing::warn!("Account check failed for {}: {}", device.display(), e);
        AuthError::AccountInvalid { message: e.message }
    })?;

    transaction.principal().ok_or_else(|| {
        tracing::error!("No user provided by the authentication stack");
        AuthError::NoPrincipalResolved
    })
}
