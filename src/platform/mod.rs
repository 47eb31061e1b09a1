//! Platform capabilities consumed by the analytics layer.
//!
//! Everything that touches the OS goes through one of four traits:
//!
//! - [`Clock`] - wall-clock time in milliseconds
//! - [`KeyValueStore`] - durable preferences storage
//! - [`DeviceInfoProvider`] - device properties and bundle identifier
//! - [`CrashHookRegistrar`] - uncaught crash notification
//!
//! [`Platform`] bundles one implementation of each so a host can hand the
//! whole set to [`Analytics`](crate::Analytics) in one value.

pub mod clock;
pub mod crash;
pub mod device;
pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crash::{
    CrashCallback, CrashHookRegistrar, ManualCrashHookRegistrar, NoopCrashHookRegistrar,
    PanicHookRegistrar,
};
pub use device::{DeviceInfo, DeviceInfoProvider, HostDeviceInfo, StaticDeviceInfo};
pub use storage::{default_store_path, FileStore, KeyValueStore, MemoryStore};

/// The set of platform services an [`Analytics`](crate::Analytics) instance uses.
#[derive(Clone)]
pub struct Platform {
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn KeyValueStore>,
    pub device: Arc<dyn DeviceInfoProvider>,
    pub crash_hooks: Arc<dyn CrashHookRegistrar>,
}

impl Platform {
    /// Real clock, file-backed store at the default path, detected device
    /// info, and the panic hook.
    pub fn host() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            store: Arc::new(FileStore::open_default()),
            device: Arc::new(HostDeviceInfo::detect()),
            crash_hooks: Arc::new(PanicHookRegistrar),
        }
    }

    /// Real clock and device info, but nothing written to disk and no
    /// process-wide hooks.
    pub fn headless() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            store: Arc::new(MemoryStore::new()),
            device: Arc::new(HostDeviceInfo::detect()),
            crash_hooks: Arc::new(NoopCrashHookRegistrar),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    /// Use a [`FileStore`] at `path`.
    pub fn with_store_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_store(Arc::new(FileStore::new(path)))
    }

    pub fn with_device(mut self, device: Arc<dyn DeviceInfoProvider>) -> Self {
        self.device = device;
        self
    }

    pub fn with_crash_hooks(mut self, crash_hooks: Arc<dyn CrashHookRegistrar>) -> Self {
        self.crash_hooks = crash_hooks;
        self
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::host()
    }
}
