//! Single-session manager.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::state::{ActiveSession, Session};
use crate::bus::{AuthEvent, EventBus};
use crate::error::AuthError;
use crate::traits::{CredentialVerifier, VerificationOutcome};

/// Owns the one session and drives login and logout against a verifier.
///
/// Login and logout hold one async lock from the state check through the
/// verifier call to the state change, so two attempts never interleave. A
/// slow verification holds up every other attempt. Notifications are
/// published after the lock is released.
pub struct SessionManager {
    state: Mutex<Session>,
    verifier: Arc<dyn CredentialVerifier>,
    bus: EventBus,
}

impl SessionManager {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, bus: EventBus) -> Self {
        Self {
            state: Mutex::new(Session::Empty),
            verifier,
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Open a session with the key on `device`.
    ///
    /// Fails with [`AuthError::AlreadyLoggedIn`] without consulting the
    /// verifier when a session is open, or with the verifier's reason when
    /// the key is refused. Every failure is also published as `failed`.
    pub async fn login(&self, device: &Path) -> Result<ActiveSession, AuthError> {
        let result = {
            let mut state = self.state.lock().await;
            if let Session::Active(current) = &*state {
                tracing::warn!(
                    "Login on {} refused: {} is logged in from {}",
                    device.display(),
                    current.principal,
                    current.device.display()
                );
                Err(AuthError::AlreadyLoggedIn)
            } else {
                tracing::debug!(
                    "Verifying {} with the {} verifier",
                    device.display(),
                    self.verifier.name()
                );
                match self.verifier.verify(device).await {
                    VerificationOutcome::Resolved(principal) => {
                        let session = ActiveSession::new(device, principal);
                        *state = Session::Active(session.clone());
                        Ok(session)
                    }
                    VerificationOutcome::Rejected(err) => Err(err),
                }
            }
        };

        match &result {
            Ok(session) => {
                tracing::info!("Logged in {} from {}", session.principal, device.display());
                self.bus.publish(AuthEvent::Login {
                    device: session.device.clone(),
                    principal: session.principal.clone(),
                });
            }
            Err(err) => {
                tracing::warn!("Login on {} failed: {}", device.display(), err);
                self.bus.publish(AuthEvent::failed(device, err));
            }
        }
        result
    }

    /// Close the session opened by the key on `device`.
    ///
    /// Fails with [`AuthError::DeviceMismatch`] when no session is open or
    /// when another key opened it.
    pub async fn logout(&self, device: &Path) -> Result<ActiveSession, AuthError> {
        let result = {
            let mut state = self.state.lock().await;
            state.close_for(device).ok_or_else(|| AuthError::DeviceMismatch {
                device: device.to_path_buf(),
            })
        };

        match &result {
            Ok(closed) => {
                tracing::info!("Logged out {} from {}", closed.principal, device.display());
                self.bus.publish(AuthEvent::Logout {
                    device: closed.device.clone(),
                    principal: closed.principal.clone(),
                });
            }
            Err(err) => {
                tracing::debug!("Logout on {} ignored: {}", device.display(), err);
                self.bus.publish(AuthEvent::failed(device, err));
            }
        }
        result
    }

    /// The open session, if any.
    pub async fn current_session(&self) -> Option<ActiveSession> {
        self.state.lock().await.active().cloned()
    }

    /// The logged in principal.
    pub async fn current_user(&self) -> Result<String, AuthError> {
        self.current_session()
            .await
            .map(|session| session.principal)
            .ok_or(AuthError::NoActiveSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockVerifier;
    use crate::bus::EventKind;
    use std::path::PathBuf;
    use std::time::Duration;

    fn manager(verifier: MockVerifier) -> (SessionManager, EventBus) {
        let bus = EventBus::new(16);
        (SessionManager::new(Arc::new(verifier), bus.clone()), bus)
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let (manager, bus) = manager(MockVerifier::resolving("alice"));
        let mut sub = bus.subscribe_all();
        let sdb = Path::new("/dev/sdb");

        let session = manager.login(sdb).await.unwrap();
        assert_eq!(session.principal, "alice");
        assert_eq!(manager.current_user().await.unwrap(), "alice");

        let closed = manager.logout(sdb).await.unwrap();
        assert_eq!(closed.principal, "alice");
        assert!(manager.current_session().await.is_none());

        assert_eq!(
            sub.try_recv().unwrap().event,
            AuthEvent::Login {
                device: sdb.to_path_buf(),
                principal: "alice".to_string()
            }
        );
        assert_eq!(
            sub.try_recv().unwrap().event,
            AuthEvent::Logout {
                device: sdb.to_path_buf(),
                principal: "alice".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_second_login_refused_without_verifying() {
        let verifier = MockVerifier::resolving("alice");
        let (manager, bus) = manager(verifier.clone());
        manager.login(Path::new("/dev/sdb")).await.unwrap();
        let mut failures = bus.subscribe(&[EventKind::Failed]);

        let err = manager.login(Path::new("/dev/sdc")).await.unwrap_err();
        assert_eq!(err, AuthError::AlreadyLoggedIn);
        assert_eq!(verifier.call_count(), 1);
        assert_eq!(
            manager.current_session().await.unwrap().device,
            PathBuf::from("/dev/sdb")
        );
        assert_eq!(failures.try_recv().unwrap().kind(), EventKind::Failed);
    }

    #[tokio::test]
    async fn test_rejected_login_stays_empty() {
        let (manager, bus) = manager(MockVerifier::rejecting(AuthError::KeyNotFound {
            uuid: "x".to_string(),
        }));
        let mut sub = bus.subscribe_all();

        let err = manager.login(Path::new("/dev/sdb")).await.unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound { .. }));
        assert!(manager.current_session().await.is_none());

        match sub.try_recv().unwrap().event {
            AuthEvent::Failed { code, .. } => assert_eq!(code, "E_AUTH_KEY_NOT_FOUND"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_logout_wrong_device() {
        let (manager, _bus) = manager(MockVerifier::resolving("alice"));
        manager.login(Path::new("/dev/sdb")).await.unwrap();

        let err = manager.logout(Path::new("/dev/sdc")).await.unwrap_err();
        assert!(matches!(err, AuthError::DeviceMismatch { .. }));
        assert_eq!(manager.current_user().await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_logout_when_empty() {
        let (manager, _bus) = manager(MockVerifier::resolving("alice"));
        let err = manager.logout(Path::new("/dev/sdb")).await.unwrap_err();
        assert!(matches!(err, AuthError::DeviceMismatch { .. }));
        assert_eq!(manager.current_user().await, Err(AuthError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_relogin_after_logout() {
        let verifier = MockVerifier::resolving("alice");
        let (manager, _bus) = manager(verifier.clone());
        let sdb = Path::new("/dev/sdb");

        manager.login(sdb).await.unwrap();
        manager.logout(sdb).await.unwrap();
        verifier.set_outcome(VerificationOutcome::Resolved("bob".to_string()));
        manager.login(Path::new("/dev/sdc")).await.unwrap();
        assert_eq!(manager.current_user().await.unwrap(), "bob");
    }

    #[tokio::test]
    async fn test_concurrent_logins_serialize() {
        let verifier = MockVerifier::resolving("alice");
        verifier.set_delay(Duration::from_millis(50));
        let (manager, _bus) = manager(verifier.clone());
        let manager = Arc::new(manager);

        let a = {
            let m = Arc::clone(&manager);
            tokio::spawn(async move { m.login(Path::new("/dev/sdb")).await })
        };
        let b = {
            let m = Arc::clone(&manager);
            tokio::spawn(async move { m.login(Path::new("/dev/sdc")).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::AlreadyLoggedIn))));
        assert_eq!(verifier.call_count(), 1);
    }
}
