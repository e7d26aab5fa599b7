//! Device event source trait abstraction.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DeviceError;

/// A device notification in the source's own vocabulary.
///
/// Classification into [`crate::device_watcher::DeviceEvent`] happens once,
/// at the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeviceEvent {
    /// Action string, e.g. `add`, `remove`, `change`.
    pub action: String,
    /// Device node, when the device has one.
    pub dev_node: Option<PathBuf>,
    pub subsystem: String,
    pub dev_type: String,
}

impl RawDeviceEvent {
    pub fn new(
        action: impl Into<String>,
        dev_node: Option<PathBuf>,
        subsystem: impl Into<String>,
        dev_type: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            dev_node,
            subsystem: subsystem.into(),
            dev_type: dev_type.into(),
        }
    }

    /// A block disk being attached.
    pub fn disk_added(dev_node: impl Into<PathBuf>) -> Self {
        Self::new("add", Some(dev_node.into()), "block", "disk")
    }

    /// A block disk being detached.
    pub fn disk_removed(dev_node: impl Into<PathBuf>) -> Self {
        Self::new("remove", Some(dev_node.into()), "block", "disk")
    }
}

/// A source of hotplug notifications.
#[async_trait]
pub trait DeviceEventSource: Send {
    /// Wait up to `timeout` for the next notification.
    ///
    /// - `Ok(Some(event))`: a notification arrived
    /// - `Ok(None)`: the timeout elapsed with nothing to report
    /// - `Err(DeviceError::ReceiveFailed)`: this receive failed; later ones may work
    /// - `Err(DeviceError::SourceClosed)`: nothing will ever arrive again
    ///
    /// Must be cancel safe: dropping the future loses no event.
    async fn next_event(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<RawDeviceEvent>, DeviceError>;
}
