//! Transactional authentication stack abstraction.
//!
//! Models a pluggable login stack: a transaction is started for a named
//! rule, given environment variables, asked to authenticate and validate
//! the account, queried for the user it settled on, and ended.
//!
//! All calls are blocking.

use thiserror::Error;

/// Failure reported by an authentication stack call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StackError {
    pub message: String,
}

impl StackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Entry point of an authentication stack.
pub trait AuthStack: Send + Sync {
    /// Open a transaction for the rule `rule`.
    fn start(&self, rule: &str) -> Result<Box<dyn AuthTransaction>, StackError>;
}

/// One open authentication transaction.
///
/// Callers must finish every transaction with [`AuthTransaction::end`],
/// whatever happened before.
pub trait AuthTransaction: Send {
    /// Set a variable in the transaction environment from a `NAME=value`
    /// assignment.
    fn put_env(&mut self, assignment: &str) -> Result<(), StackError>;

    /// Read a variable from the transaction environment.
    fn get_env(&self, name: &str) -> Option<String>;

    /// Run the authenticate step.
    fn authenticate(&mut self) -> Result<(), StackError>;

    /// Run the account validity step.
    fn check_account(&mut self) -> Result<(), StackError>;

    /// The user the stack resolved, if any.
    fn principal(&self) -> Option<String>;

    /// Close the transaction.
    fn end(self: Box<Self>) -> Result<(), StackError>;
}

/// Build a `NAME=value` assignment for [`AuthTransaction::put_env`].
pub fn env_assignment(name: &str, value: &str) -> String {
    let mut assignment = String::with_capacity(name.len() + 1 + value.len());
    assignment.push_str(name);
    assignment.push('=');
    assignment.push_str(value);
    assignment
}
