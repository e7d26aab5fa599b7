//! Concrete implementations of trait abstractions.
//!
//! # Verifiers
//!
//! - [`InteractiveAuthVerifier`] - Runs an authentication stack transaction
//! - [`TrustStoreVerifier`] - Reads the key and checks the trust store
//!
//! # Authentication stacks
//!
//! - [`ModuleStack`] - In-process rule table with the [`IdKeyModule`]
//!
//! # Device event sources
//!
//! - [`DevWatcherSource`] - Watches the device directory
//! - [`ChannelSource`] - Fed through an mpsc channel
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for the verifier and the
//! authentication stack.

pub mod channel_source;
pub mod dev_watcher;
pub mod interactive_auth;
pub mod mock;
pub mod module_stack;
pub mod trust_store_lookup;

pub use channel_source::{ChannelSource, DeviceEventSender};
pub use dev_watcher::DevWatcherSource;
pub use interactive_auth::InteractiveAuthVerifier;
pub use mock::{MockAuthStack, MockVerifier};
pub use module_stack::{AuthModule, IdKeyModule, KeySource, ModuleStack, TransactionItems};
pub use trust_store_lookup::TrustStoreVerifier;
