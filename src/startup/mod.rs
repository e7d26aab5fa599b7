//! Startup: configuration and service assembly.
//!
//! # Components
//!
//! - [`config`] - Layered configuration
//! - [`authenticator`] - Builds the verifier and starts the listener
//!
//! # Usage
//!
//! ```ignore
//! use idkey_auth::startup::{AuthConfig, Authenticator};
//!
//! let config = AuthConfig::load(None)?;
//! let authenticator = Authenticator::start(config)?;
//! // ...
//! authenticator.shutdown().await;
//! ```

pub mod authenticator;
pub mod config;

pub use authenticator::{build_verifier, Authenticator};
pub use config::{default_config_path, AuthConfig, Backend};
