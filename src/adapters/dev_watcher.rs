//! Device event source built on filesystem notifications for the device
//! directory.
//!
//! Device nodes appearing under `/dev` become `add` events and nodes
//! disappearing become `remove` events. Subsystem and device type come from
//! the kernel's sysfs `uevent` file for the node. They are read when the
//! node appears and remembered, since sysfs is already gone by the time the
//! node is removed.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::DeviceError;
use crate::traits::{DeviceEventSource, RawDeviceEvent};

/// Default device directory.
pub const DEFAULT_DEV_DIR: &str = "/dev";

/// Default sysfs block class directory.
pub const DEFAULT_SYS_BLOCK_DIR: &str = "/sys/class/block";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct NodeInfo {
    subsystem: String,
    dev_type: String,
}

/// Hotplug source watching a device directory.
pub struct DevWatcherSource {
    /// Must stay alive; dropping it stops the watch.
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    sys_block_dir: PathBuf,
    pending: VecDeque<RawDeviceEvent>,
    known: HashMap<PathBuf, NodeInfo>,
}

impl DevWatcherSource {
    /// Start watching `dev_dir` (non-recursively).
    pub fn new(dev_dir: &Path, sys_block_dir: &Path) -> Result<Self, DeviceError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            // Receiver gone means the source was dropped.
            let _ = tx.send(res);
        })
        .map_err(|e| DeviceError::WatchFailed {
            path: dev_dir.to_path_buf(),
            message: e.to_string(),
        })?;

        watcher
            .watch(dev_dir, RecursiveMode::NonRecursive)
            .map_err(|e| DeviceError::WatchFailed {
                path: dev_dir.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::info!("Watching {} for device nodes", dev_dir.display());
        Ok(Self {
            _watcher: watcher,
            rx,
            sys_block_dir: sys_block_dir.to_path_buf(),
            pending: VecDeque::new(),
            known: HashMap::new(),
        })
    }

    fn translate(&mut self, event: notify::Event) {
        let action = match event.kind {
            EventKind::Create(_) => "add",
            EventKind::Remove(_) => "remove",
            EventKind::Modify(_) => "change",
            // Opening a key for reading shows up as access; never interesting.
            EventKind::Access(_) | EventKind::Any | EventKind::Other => return,
        };

        for path in event.paths {
            let info = match action {
                "add" => {
                    let info = self.read_node_info(&path);
                    self.known.insert(path.clone(), info.clone());
                    info
                }
                "remove" => self
                    .known
                    .remove(&path)
                    .unwrap_or_else(|| self.read_node_info(&path)),
                _ => self
                    .known
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| self.read_node_info(&path)),
            };

            self.pending.push_back(RawDeviceEvent::new(
                action,
                Some(path),
                info.subsystem,
                info.dev_type,
            ));
        }
    }

    fn read_node_info(&self, node: &Path) -> NodeInfo {
        let Some(name) = node.file_name() else {
            return NodeInfo::default();
        };
        let uevent_path = self.sys_block_dir.join(name).join("uevent");
        match std::fs::read_to_string(&uevent_path) {
            Ok(contents) => {
                let fields = parse_uevent(&contents);
                NodeInfo {
                    subsystem: "block".to_string(),
                    dev_type: fields.get("DEVTYPE").cloned().unwrap_or_default(),
                }
            }
            Err(_) => NodeInfo::default(),
        }
    }
}

#[async_trait]
impl DeviceEventSource for DevWatcherSource {
    async fn next_event(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<RawDeviceEvent>, DeviceError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(DeviceError::SourceClosed),
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(Some(Ok(event))) => {
                self.translate(event);
                Ok(self.pending.pop_front())
            }
        }
    }
}

/// Parse the `KEY=value` lines of a sysfs `uevent` file.
pub fn parse_uevent(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, RemoveKind};
    use tempfile::TempDir;

    const DISK_UEVENT: &str = "MAJOR=8\nMINOR=16\nDEVNAME=sdb\nDEVTYPE=disk\nDISKSEQ=9\n";

    #[test]
    fn test_parse_uevent() {
        let fields = parse_uevent(DISK_UEVENT);
        assert_eq!(fields.get("DEVTYPE").map(String::as_str), Some("disk"));
        assert_eq!(fields.get("DEVNAME").map(String::as_str), Some("sdb"));
        assert!(!fields.contains_key("garbage"));
    }

    #[test]
    fn test_parse_uevent_partition() {
        let fields = parse_uevent("DEVNAME=sdb1\nDEVTYPE=partition\nPARTN=1\n");
        assert_eq!(fields.get("DEVTYPE").map(String::as_str), Some("partition"));
    }

    fn setup() -> (TempDir, TempDir, DevWatcherSource) {
        let dev = TempDir::new().unwrap();
        let sys = TempDir::new().unwrap();
        std::fs::create_dir(sys.path().join("sdb")).unwrap();
        std::fs::write(sys.path().join("sdb").join("uevent"), DISK_UEVENT).unwrap();
        let source = DevWatcherSource::new(dev.path(), sys.path()).unwrap();
        (dev, sys, source)
    }

    #[tokio::test]
    async fn test_translate_add_then_remove_after_sysfs_gone() {
        let (dev, sys, mut source) = setup();
        let node = dev.path().join("sdb");

        source.translate(
            notify::Event::new(EventKind::Create(CreateKind::File)).add_path(node.clone()),
        );
        let added = source.pending.pop_front().unwrap();
        assert_eq!(added, RawDeviceEvent::new("add", Some(node.clone()), "block", "disk"));

        std::fs::remove_dir_all(sys.path().join("sdb")).unwrap();
        source.translate(
            notify::Event::new(EventKind::Remove(RemoveKind::File)).add_path(node.clone()),
        );
        let removed = source.pending.pop_front().unwrap();
        assert_eq!(removed, RawDeviceEvent::new("remove", Some(node), "block", "disk"));
    }

    #[tokio::test]
    async fn test_translate_non_block_node() {
        let (dev, _sys, mut source) = setup();
        let node = dev.path().join("ttyUSB0");
        source.translate(notify::Event::new(EventKind::Create(CreateKind::File)).add_path(node));
        let event = source.pending.pop_front().unwrap();
        assert_eq!(event.subsystem, "");
        assert_eq!(event.dev_type, "");
    }

    #[tokio::test]
    async fn test_access_events_ignored() {
        let (dev, _sys, mut source) = setup();
        source.translate(
            notify::Event::new(EventKind::Access(AccessKind::Any)).add_path(dev.path().join("sdb")),
        );
        assert!(source.pending.is_empty());
    }

    #[tokio::test]
    async fn test_live_node_creation() {
        let (dev, _sys, mut source) = setup();
        std::fs::write(dev.path().join("sdb"), b"").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let mut found = None;
        while tokio::time::Instant::now() < deadline {
            if let Ok(Some(event)) = source.next_event(Duration::from_millis(200)).await {
                if event.action == "add" {
                    found = Some(event);
                    break;
                }
            }
        }

        let event = found.expect("no add event seen");
        assert_eq!(event.dev_type, "disk");
    }

    #[test]
    fn test_watch_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = DevWatcherSource::new(&dir.path().join("absent"), dir.path());
        assert!(matches!(result, Err(DeviceError::WatchFailed { .. })));
    }
}
