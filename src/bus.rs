//! Session event bus.
//!
//! Login, logout and failure notifications are broadcast over a tokio
//! broadcast channel. Publishing never blocks and never fails: with no
//! subscriber the notification is dropped. A subscriber that falls more
//! than the channel capacity behind loses the oldest notifications.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::AuthError;

/// Default channel capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Notification kinds a subscriber can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Login,
    Logout,
    Failed,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Login, EventKind::Logout, EventKind::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Login => "login",
            EventKind::Logout => "logout",
            EventKind::Failed => "failed",
        }
    }

    /// Parse a kind name as used by subscribers.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "login" => Some(EventKind::Login),
            "logout" => Some(EventKind::Logout),
            "failed" => Some(EventKind::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a session notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A session was opened.
    Login { device: PathBuf, principal: String },
    /// The session was closed.
    Logout { device: PathBuf, principal: String },
    /// A login or logout attempt failed.
    Failed {
        device: PathBuf,
        code: String,
        message: String,
    },
}

impl AuthEvent {
    /// Failure notification for an attempt on `device`.
    pub fn failed(device: impl Into<PathBuf>, err: &AuthError) -> Self {
        AuthEvent::Failed {
            device: device.into(),
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            AuthEvent::Login { .. } => EventKind::Login,
            AuthEvent::Logout { .. } => EventKind::Logout,
            AuthEvent::Failed { .. } => EventKind::Failed,
        }
    }
}

/// A published event with its publication time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthNotification {
    pub timestamp: DateTime<Utc>,
    pub event: AuthEvent,
}

impl AuthNotification {
    pub fn new(event: AuthEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

/// Broadcast bus for session notifications. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AuthNotification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish `event` to every current subscriber.
    ///
    /// Returns how many subscribers were reached. Zero is not an error.
    pub fn publish(&self, event: AuthEvent) -> usize {
        let kind = event.kind();
        match self.tx.send(AuthNotification::new(event)) {
            Ok(reached) => {
                tracing::debug!("Published {} to {} subscribers", kind, reached);
                reached
            }
            Err(_) => {
                tracing::trace!("Published {} with no subscribers", kind);
                0
            }
        }
    }

    /// Subscribe to the given kinds only.
    pub fn subscribe(&self, kinds: &[EventKind]) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            kinds: kinds.to_vec(),
        }
    }

    /// Subscribe to every kind.
    pub fn subscribe_all(&self) -> Subscription {
        self.subscribe(&EventKind::ALL)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// Receiving end of a bus subscription.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<AuthNotification>,
    kinds: Vec<EventKind>,
}

impl Subscription {
    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }

    /// Wait for the next notification of a subscribed kind.
    ///
    /// Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<AuthNotification> {
        loop {
            match self.rx.recv().await {
                Ok(notification) if self.kinds.contains(&notification.kind()) => {
                    return Some(notification)
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Subscriber lagged, {} notifications dropped", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next already queued notification of a subscribed kind.
    pub fn try_recv(&mut self) -> Option<AuthNotification> {
        loop {
            match self.rx.try_recv() {
                Ok(notification) if self.kinds.contains(&notification.kind()) => {
                    return Some(notification)
                }
                Ok(_) => continue,
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!("Subscriber lagged, {} notifications dropped", missed);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
