//! idkey-auth - hotplug identity key authentication.
//!
//! Plugging an enrolled identity key opens a single user session;
//! unplugging that same key closes it. Session changes are broadcast to
//! subscribers.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod bus;
pub mod cli;
pub mod device_watcher;
pub mod error;
pub mod keyfile;
pub mod session;
pub mod startup;
pub mod traits;
pub mod trust_store;
