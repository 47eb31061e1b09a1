//! Settings schema for the analytics SDK.
//!
//! Every section is `#[serde(default)]` so a settings file only needs the
//! values it wants to change.

use serde::{Deserialize, Serialize};

use crate::analytics::DeviceEvent;
use crate::session::DEFAULT_MAX_BUFFERED_EVENTS;

/// Root settings structure.
///
/// Loaded from `~/.bms/analytics.toml`; string values may reference
/// environment variables as `$VAR` or `${VAR}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Application identity
    pub app: AppSettings,

    /// What gets tracked
    pub tracking: TrackingSettings,

    /// Durable storage for the device identifier
    pub storage: StorageSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Application identity reported to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Reported as `mfpAppName` (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Analytics API key (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Bundle identifier used when no app name is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Master switch for custom and network events
    pub enabled: bool,

    /// Events recorded automatically: "lifecycle" | "network"
    pub device_events: Vec<DeviceEvent>,

    /// Maximum events buffered before the oldest are dropped (0 = unlimited)
    pub max_buffered_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Path of the key-value store file (defaults to the platform data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            version: 1,
            app: AppSettings::default(),
            tracking: TrackingSettings::default(),
            storage: StorageSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            device_events: Vec::new(),
            max_buffered_events: DEFAULT_MAX_BUFFERED_EVENTS,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
