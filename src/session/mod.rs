//! The single authenticated session.
//!
//! Plugging an enrolled key opens the session; unplugging the same key
//! closes it. While a session is open every other key is refused.

mod manager;
mod state;

pub use manager::SessionManager;
pub use state::{ActiveSession, Session};
