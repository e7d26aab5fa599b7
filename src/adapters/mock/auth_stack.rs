//! Mock authentication stack for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{AuthStack, AuthTransaction, StackError};

/// Stage at which a [`MockAuthStack`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStage {
    Start,
    PutEnv,
    Authenticate,
    CheckAccount,
}

/// Calls observed by a [`MockAuthStack`] across all its transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStackLog {
    pub started_rules: Vec<String>,
    pub env: Vec<String>,
    pub stages: Vec<StackStage>,
    pub end_calls: usize,
}

/// Authentication stack with scripted failures and principal.
#[derive(Debug, Clone)]
pub struct MockAuthStack {
    fail_at: Option<StackStage>,
    fail_end: bool,
    principal: Option<String>,
    log: Arc<Mutex<MockStackLog>>,
}

impl MockAuthStack {
    /// Stack whose transactions succeed and resolve to `principal`.
    pub fn resolving(principal: impl Into<String>) -> Self {
        Self {
            fail_at: None,
            fail_end: false,
            principal: Some(principal.into()),
            log: Arc::new(Mutex::new(MockStackLog::default())),
        }
    }

    /// Stack whose transactions succeed without ever setting a user.
    pub fn without_principal() -> Self {
        Self {
            principal: None,
            ..Self::resolving("")
        }
    }

    /// Fail at `stage`.
    pub fn failing_at(mut self, stage: StackStage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Fail when the transaction is ended.
    pub fn failing_end(mut self) -> Self {
        self.fail_end = true;
        self
    }

    /// Snapshot of the calls seen so far.
    pub fn log(&self) -> MockStackLog {
        self.log.lock().unwrap().clone()
    }

    fn check(&self, stage: StackStage) -> Result<(), StackError> {
        self.log.lock().unwrap().stages.push(stage);
        if self.fail_at == Some(stage) {
            return Err(StackError::new(format!("mock failure at {:?}", stage)));
        }
        Ok(())
    }
}

impl AuthStack for MockAuthStack {
    fn start(&self, rule: &str) -> Result<Box<dyn AuthTransaction>, StackError> {
        self.log.lock().unwrap().started_rules.push(rule.to_string());
        self.check(StackStage::Start)?;
        Ok(Box::new(MockTransaction {
            stack: self.clone(),
            env: HashMap::new(),
        }))
    }
}

struct MockTransaction {
    stack: MockAuthStack,
    env: HashMap<String, String>,
}

impl AuthTransaction for MockTransaction {
    fn put_env(&mut self, assignment: &str) -> Result<(), StackError> {
        self.stack.log.lock().unwrap().env.push(assignment.to_string());
        self.stack.check(StackStage::PutEnv)?;
        if let Some((name, value)) = assignment.split_once('=') {
            self.env.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn get_env(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn authenticate(&mut self) -> Result<(), StackError> {
        self.stack.check(StackStage::Authenticate)
    }

    fn check_account(&mut self) -> Result<(), StackError> {
        self.stack.check(StackStage::CheckAccount)
    }

    fn principal(&self) -> Option<String> {
        self.stack.principal.clone()
    }

    fn end(self: Box<Self>) -> Result<(), StackError> {
        self.stack.log.lock().unwrap().end_calls += 1;
        if self.stack.fail_end {
            return Err(StackError::new("mock failure at end"));
        }
        Ok(())
    }
}
