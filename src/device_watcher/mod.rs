//! Hotplug listener.
//!
//! ```text
//! ┌──────────────────────┐
//! │  DeviceEventSource   │  DevWatcherSource (notify) / ChannelSource
//! └──────────┬───────────┘
//!            ▼
//!    ┌───────────────┐
//!    │   Listener    │  timed wait, backoff on receive errors
//!    └───────┬───────┘
//!            ▼ disk add / remove
//!    ┌───────────────┐
//!    │ SessionManager│  login / logout
//!    └───────┬───────┘
//!            ▼
//!    ┌───────────────┐
//!    │   EventBus    │  login / logout / failed
//!    └───────────────┘
//! ```

mod listener;
mod state;
mod types;

pub use listener::{
    dispatch, run_listener, spawn_device_listener, ListenerConfig, ListenerExit,
    DEFAULT_POLL_TIMEOUT,
};
pub use state::ExponentialBackoff;
pub use types::{DeviceAction, DeviceEvent, DISK_DEV_TYPE};
