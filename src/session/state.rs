//! Session state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The open session: which key opened it and who it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveSession {
    pub device: PathBuf,
    pub principal: String,
    pub opened_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn new(device: impl Into<PathBuf>, principal: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            principal: principal.into(),
            opened_at: Utc::now(),
        }
    }

    /// Whether this session was opened by the key on `device`.
    pub fn is_device(&self, device: &Path) -> bool {
        self.device == device
    }
}

/// At most one session exists at a time. Device and principal are set
/// together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Empty,
    Active(ActiveSession),
}

impl Session {
    pub fn is_active(&self) -> bool {
        matches!(self, Session::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            Session::Active(session) => Some(session),
            Session::Empty => None,
        }
    }

    /// Close the session if `device` opened it, returning the closed session.
    pub fn close_for(&mut self, device: &Path) -> Option<ActiveSession> {
        match self {
            Session::Active(session) if session.is_device(device) => {
                match std::mem::take(self) {
                    Session::Active(closed) => Some(closed),
                    Session::Empty => None,
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let session = Session::default();
        assert!(!session.is_active());
        assert!(session.active().is_none());
    }

    #[test]
    fn test_close_for_matching_device() {
        let mut session = Session::Active(ActiveSession::new("/dev/sdb", "alice"));
        let closed = session.close_for(Path::new("/dev/sdb")).unwrap();
        assert_eq!(closed.principal, "alice");
        assert_eq!(session, Session::Empty);
    }

    #[test]
    fn test_close_for_other_device_keeps_session() {
        let mut session = Session::Active(ActiveSession::new("/dev/sdb", "alice"));
        assert!(session.close_for(Path::new("/dev/sdc")).is_none());
        assert!(session.is_active());
    }

    #[test]
    fn test_close_for_when_empty() {
        let mut session = Session::Empty;
        assert!(session.close_for(Path::new("/dev/sdb")).is_none());
    }
}
