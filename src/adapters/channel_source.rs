//! Channel-fed device event source.
//!
//! Lets a host process (or a test) push notifications into the listener,
//! including receive failures.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::DeviceError;
use crate::traits::{DeviceEventSource, RawDeviceEvent};

/// Sending half paired with a [`ChannelSource`].
pub type DeviceEventSender = mpsc::Sender<Result<RawDeviceEvent, DeviceError>>;

/// Device event source reading from an mpsc channel.
///
/// The source reports [`DeviceError::SourceClosed`] once every sender is
/// dropped and the queue is drained.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Result<RawDeviceEvent, DeviceError>>,
}

impl ChannelSource {
    /// Create a source and its sender.
    pub fn new(capacity: usize) -> (DeviceEventSender, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl DeviceEventSource for ChannelSource {
    async fn next_event(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<RawDeviceEvent>, DeviceError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(DeviceError::SourceClosed),
            Ok(Some(item)) => item.map(Some),
        }
    }
}
