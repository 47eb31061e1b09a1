//! TOML settings for the analytics SDK.
//!
//! Settings live in `~/.bms/analytics.toml`. Credential fields may point at
//! environment variables, and `get_with_env_fallback` lets callers fall back
//! to `BMS_ANALYTICS_*` variables when the file leaves a value unset.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bms_analytics::settings::{SettingsManager, get_with_env_fallback};
//!
//! let manager = SettingsManager::new()?;
//! let settings = manager.get();
//!
//! let api_key = get_with_env_fallback(
//!     &settings.app.api_key,
//!     &["BMS_ANALYTICS_API_KEY"],
//!     None,
//! );
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, settings_path, SettingsManager};
pub use schema::AnalyticsSettings;

/// Environment fallback for `app.app_name`.
pub const APP_NAME_ENV: &str = "BMS_ANALYTICS_APP_NAME";

/// Environment fallback for `app.api_key`.
pub const API_KEY_ENV: &str = "BMS_ANALYTICS_API_KEY";
