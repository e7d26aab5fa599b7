//! Classified device events.

use std::path::PathBuf;

use crate::traits::RawDeviceEvent;

/// Device type of removable whole disks.
pub const DISK_DEV_TYPE: &str = "disk";

/// What happened to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAction {
    Added,
    Removed,
    /// Any other action, kept verbatim for logging.
    Unsupported(String),
}

impl DeviceAction {
    pub fn from_raw(action: &str) -> Self {
        match action {
            "add" => DeviceAction::Added,
            "remove" => DeviceAction::Removed,
            other => DeviceAction::Unsupported(other.to_string()),
        }
    }
}

/// A hotplug notification after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEvent {
    pub action: DeviceAction,
    pub dev_node: Option<PathBuf>,
    pub subsystem: String,
    pub dev_type: String,
}

impl DeviceEvent {
    pub fn classify(raw: RawDeviceEvent) -> Self {
        Self {
            action: DeviceAction::from_raw(&raw.action),
            dev_node: raw.dev_node,
            subsystem: raw.subsystem,
            dev_type: raw.dev_type,
        }
    }

    /// The node of a removable disk, or `None` when the event is about
    /// anything else.
    pub fn disk_node(&self) -> Option<&PathBuf> {
        if self.dev_type == DISK_DEV_TYPE {
            self.dev_node.as_ref()
        } else {
            None
        }
    }
}
