//! Device and application identity lookups.

use serde::{Deserialize, Serialize};

/// Properties of the device the SDK is running on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Platform name, e.g. "iOS", "Android", "Linux"
    pub os: String,
    /// Device manufacturer
    pub brand: String,
    /// Hardware model
    pub model: String,
    /// Operating system version string
    pub os_version: String,
}

/// Platform lookups for device properties and the host application's
/// bundle identifier.
pub trait DeviceInfoProvider: Send + Sync {
    fn device_info(&self) -> DeviceInfo;

    /// The application bundle identifier, if the host has one.
    fn bundle_identifier(&self) -> Option<String>;
}

/// Values detected from the compile target and the running kernel.
#[derive(Debug, Clone)]
pub struct HostDeviceInfo {
    info: DeviceInfo,
    bundle_identifier: Option<String>,
}

impl HostDeviceInfo {
    pub fn detect() -> Self {
        let os = std::env::consts::OS;
        let info = DeviceInfo {
            os: platform_name(os).to_string(),
            brand: platform_brand(os).to_string(),
            model: std::env::consts::ARCH.to_string(),
            os_version: detect_os_version(),
        };
        tracing::trace!("[device] Detected host device info: {:?}", info);

        Self {
            info,
            bundle_identifier: None,
        }
    }

    /// Set the bundle identifier used when no app name is configured.
    pub fn with_bundle_identifier(mut self, bundle_identifier: impl Into<String>) -> Self {
        let id = bundle_identifier.into();
        self.bundle_identifier = if id.is_empty() { None } else { Some(id) };
        self
    }
}

impl Default for HostDeviceInfo {
    fn default() -> Self {
        Self::detect()
    }
}

impl DeviceInfoProvider for HostDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn bundle_identifier(&self) -> Option<String> {
        self.bundle_identifier.clone()
    }
}

/// Fixed answers, for tests and for hosts that know their device up front.
#[derive(Debug, Clone)]
pub struct StaticDeviceInfo {
    pub info: DeviceInfo,
    pub bundle_identifier: Option<String>,
}

impl StaticDeviceInfo {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            bundle_identifier: None,
        }
    }

    pub fn with_bundle_identifier(mut self, bundle_identifier: impl Into<String>) -> Self {
        self.bundle_identifier = Some(bundle_identifier.into());
        self
    }
}

impl DeviceInfoProvider for StaticDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn bundle_identifier(&self) -> Option<String> {
        self.bundle_identifier.clone()
    }
}

fn platform_name(os: &str) -> &str {
    match os {
        "ios" => "iOS",
        "macos" => "macOS",
        "android" => "Android",
        "linux" => "Linux",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

fn platform_brand(os: &str) -> &'static str {
    match os {
        "ios" | "macos" => "Apple",
        "android" => "Google",
        "windows" => "Microsoft",
        _ => "Generic",
    }
}

fn detect_os_version() -> String {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        if let Ok(release) = std::fs::read_to_string("/proc/sys/kernel/osrelease") {
            let release = release.trim();
            if !release.is_empty() {
                return release.to_string();
            }
        }
    }

    "unknown".to_string()
}
