//! Background task turning hotplug events into logins and logouts.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::state::ExponentialBackoff;
use super::types::{DeviceAction, DeviceEvent};
use crate::error::{AuthError, DeviceError};
use crate::session::{ActiveSession, SessionManager};
use crate::traits::DeviceEventSource;

/// Default wait for one notification.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Listener timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub poll_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(5),
        }
    }
}

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    Cancelled,
    SourceClosed,
}

/// Spawn the device listener.
///
/// Runs until `cancel` fires or the source closes. Cancelling also abandons
/// a login or logout still in progress. Dropping the handle does not stop
/// it; cancel the token instead.
pub fn spawn_device_listener(
    source: Box<dyn DeviceEventSource>,
    session: Arc<SessionManager>,
    config: ListenerConfig,
    cancel: CancellationToken,
) -> JoinHandle<ListenerExit> {
    tokio::spawn(async move {
        let mut source = source;
        run_listener(source.as_mut(), &session, &config, &cancel).await
    })
}

/// Listener loop.
pub async fn run_listener(
    source: &mut dyn DeviceEventSource,
    session: &SessionManager,
    config: &ListenerConfig,
    cancel: &CancellationToken,
) -> ListenerExit {
    let mut backoff = ExponentialBackoff::with_config(config.backoff_base, config.backoff_max);
    tracing::info!(
        "Device listener started (poll timeout {:?})",
        config.poll_timeout
    );

    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Device listener cancelled");
                return ListenerExit::Cancelled;
            }
            received = source.next_event(config.poll_timeout) => received,
        };

        match received {
            Ok(None) => backoff.reset(),
            Ok(Some(raw)) => {
                backoff.reset();
                // Dropping an unfinished login leaves the session unchanged.
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Device listener cancelled during dispatch");
                        return ListenerExit::Cancelled;
                    }
                    _ = dispatch(session, DeviceEvent::classify(raw)) => {}
                }
            }
            Err(DeviceError::SourceClosed) => {
                tracing::error!("Device event source closed, listener stopping");
                return ListenerExit::SourceClosed;
            }
            Err(err) => {
                let delay = backoff.record_failure();
                tracing::error!(
                    "Device event receive failed ({} in a row), retrying in {:?}: {}",
                    backoff.failure_count(),
                    delay,
                    err
                );
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Device listener cancelled");
                        return ListenerExit::Cancelled;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Act on one classified event.
///
/// Returns `None` when the event was ignored, otherwise the login or logout
/// result. Failures are already published by the session manager.
pub async fn dispatch(
    session: &SessionManager,
    event: DeviceEvent,
) -> Option<Result<ActiveSession, AuthError>> {
    let Some(node) = event.disk_node() else {
        tracing::trace!(
            "Ignoring {:?} on non-disk device (subsystem '{}', type '{}')",
            event.action,
            event.subsystem,
            event.dev_type
        );
        return None;
    };

    let result = match &event.action {
        DeviceAction::Added => session.login(node).await,
        DeviceAction::Removed => session.logout(node).await,
        DeviceAction::Unsupported(action) => {
            tracing::debug!("Unsupported action '{}' on {}", action, node.display());
            return None;
        }
    };

    if let Err(err) = &result {
        tracing::debug!("{:?} on {} not applied: {}", event.action, node.display(), err);
    }
    Some(result)
}
