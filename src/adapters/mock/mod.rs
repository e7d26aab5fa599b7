//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockVerifier`] - Verifier with scripted outcomes and a call log
//! - [`MockAuthStack`] - Authentication stack with scripted failures
//!
//! Device events are injected with [`crate::adapters::ChannelSource`].

pub mod auth_stack;
pub mod verifier;

pub use auth_stack::{MockAuthStack, MockStackLog, StackStage};
pub use verifier::MockVerifier;
