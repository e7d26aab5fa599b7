//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`CredentialVerifier`] - Resolve a device to a principal
//! - [`AuthStack`] / [`AuthTransaction`] - Transactional authentication stack
//! - [`DeviceEventSource`] - Hotplug notifications

pub mod auth_stack;
pub mod device_source;
pub mod verifier;

pub use auth_stack::{env_assignment, AuthStack, AuthTransaction, StackError};
pub use device_source::{DeviceEventSource, RawDeviceEvent};
pub use verifier::{CredentialVerifier, VerificationOutcome};
