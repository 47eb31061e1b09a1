//! Settings file loading and persistence.
//!
//! - Reads `~/.bms/analytics.toml` (missing file = defaults)
//! - Resolves `$VAR` / `${VAR}` references in credential fields
//! - Writes atomically through a temp file + rename
//! - Generates a commented template on first run

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;

use super::schema::AnalyticsSettings;

/// Written by `ensure_settings_file` when no settings exist yet.
const TEMPLATE: &str = include_str!("template.toml");

/// Path of the user settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bms")
        .join("analytics.toml")
}

pub struct SettingsManager {
    /// Settings with environment references already resolved
    settings: RwLock<AnalyticsSettings>,

    /// Settings as written on disk, references intact
    raw: RwLock<AnalyticsSettings>,

    path: PathBuf,
}

impl SettingsManager {
    /// Load from the default location.
    pub fn new() -> Result<Self> {
        Self::with_path(settings_path())
    }

    /// Load from `path`, falling back to defaults if it doesn't exist.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let raw = Self::load_from_path(&path)?;

        Ok(Self {
            settings: RwLock::new(resolve_env_vars(&raw)),
            raw: RwLock::new(raw),
            path,
        })
    }

    fn load_from_path(path: &Path) -> Result<AnalyticsSettings> {
        if !path.exists() {
            tracing::debug!("[settings] No settings file at {:?}, using defaults", path);
            return Ok(AnalyticsSettings::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        let settings: AnalyticsSettings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;

        tracing::info!("[settings] Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn get(&self) -> AnalyticsSettings {
        self.settings.read().clone()
    }

    /// Replace the cached settings and write them to disk.
    ///
    /// Fields that still hold what their `$VAR` reference resolved to are
    /// written back as the reference, so credentials taken from the
    /// environment never land in the file.
    pub fn update(&self, new_settings: AnalyticsSettings) -> Result<()> {
        let to_write = restore_env_refs(&self.raw.read(), &new_settings);
        let toml_string =
            toml::to_string_pretty(&to_write).context("Failed to serialize settings")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let temp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &toml_string)?;
        std::fs::rename(&temp_path, &self.path)?;

        *self.settings.write() = resolve_env_vars(&to_write);
        *self.raw.write() = to_write;
        tracing::info!("[settings] Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Look up a value by dot path, e.g. `"tracking.enabled"`.
    pub fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let json = serde_json::to_value(&*self.settings.read())?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Setting '{}' not found", key))?;
        }

        Ok(current.clone())
    }

    /// Restore defaults and persist them.
    pub fn reset(&self) -> Result<()> {
        *self.raw.write() = AnalyticsSettings::default();
        self.update(AnalyticsSettings::default())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the template if no settings file exists. Returns `true` if a
    /// file was created.
    pub fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&self.path, TEMPLATE)?;
        tracing::info!("[settings] Generated settings template at {:?}", self.path);
        Ok(true)
    }

    pub fn reload(&self) -> Result<()> {
        let raw = Self::load_from_path(&self.path)?;
        *self.settings.write() = resolve_env_vars(&raw);
        *self.raw.write() = raw;
        Ok(())
    }
}

/// Fields that may hold `$VAR` references.
fn env_fields(settings: &mut AnalyticsSettings) -> [&mut Option<String>; 4] {
    [
        &mut settings.app.app_name,
        &mut settings.app.api_key,
        &mut settings.app.bundle_id,
        &mut settings.storage.path,
    ]
}

/// Copy of `raw` with references replaced by their values. A reference to
/// an unset variable becomes `None`.
fn resolve_env_vars(raw: &AnalyticsSettings) -> AnalyticsSettings {
    let mut settings = raw.clone();
    for field in env_fields(&mut settings) {
        let Some(value) = field.as_deref() else {
            continue;
        };
        if !is_env_ref(value) {
            continue;
        }

        let resolved = resolve_env_ref(value);
        if resolved.is_none() {
            tracing::warn!("[settings] {} is not set, leaving the setting empty", value);
        }
        *field = resolved;
    }
    settings
}

/// Copy of `settings` where every field that still equals the resolution
/// of its reference in `raw` gets the reference back.
fn restore_env_refs(raw: &AnalyticsSettings, settings: &AnalyticsSettings) -> AnalyticsSettings {
    let mut raw = raw.clone();
    let mut restored = settings.clone();

    for (original, field) in env_fields(&mut raw).into_iter().zip(env_fields(&mut restored)) {
        if let Some(reference) = original.as_deref().filter(|v| is_env_ref(v)) {
            if *field == resolve_env_ref(reference) {
                *field = Some(reference.to_string());
            }
        }
    }
    restored
}

fn is_env_ref(value: &str) -> bool {
    value.trim().starts_with('$')
}

/// Resolve a `$VAR` or `${VAR}` reference.
///
/// Returns `None` when `value` isn't a reference or the variable is unset.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let reference = trimmed.strip_prefix('$')?;

    let var_name = reference
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(reference);

    std::env::var(var_name).ok()
}

/// A setting with environment fallback.
///
/// Priority:
/// 1. The setting, if set and non-empty
/// 2. The first non-empty environment variable in `env_vars`
/// 3. `default`
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting.as_ref().filter(|v| !v.is_empty()) {
        return Some(v.clone());
    }

    env_vars
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.is_empty())
        .or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_env_ref_dollar_format() {
        std::env::set_var("BMS_TEST_VAR_1", "test_value_1");
        assert_eq!(
            resolve_env_ref("$BMS_TEST_VAR_1"),
            Some("test_value_1".to_string())
        );
        std::env::remove_var("BMS_TEST_VAR_1");
    }

    #[test]
    fn test_resolve_env_ref_braces_format() {
        std::env::set_var("BMS_TEST_VAR_2", "test_value_2");
        assert_eq!(
            resolve_env_ref("${BMS_TEST_VAR_2}"),
            Some("test_value_2".to_string())
        );
        std::env::remove_var("BMS_TEST_VAR_2");
    }

    #[test]
    fn test_resolve_env_ref_no_match() {
        assert_eq!(resolve_env_ref("plain_value"), None);
        assert_eq!(resolve_env_ref("$BMS_NONEXISTENT_VAR_XYZ_12345"), None);
    }

    #[test]
    fn test_get_with_env_fallback_from_setting() {
        let setting = Some("from_settings".to_string());
        let result = get_with_env_fallback(&setting, &["BMS_SOME_VAR"], None);
        assert_eq!(result, Some("from_settings".to_string()));
    }

    #[test]
    fn test_get_with_env_fallback_from_env() {
        std::env::set_var("BMS_FALLBACK_TEST_VAR", "from_env");
        let result = get_with_env_fallback(&None, &["BMS_FALLBACK_TEST_VAR"], None);
        assert_eq!(result, Some("from_env".to_string()));
        std::env::remove_var("BMS_FALLBACK_TEST_VAR");
    }

    #[test]
    fn test_get_with_env_fallback_empty_setting_and_default() {
        let result = get_with_env_fallback(
            &Some(String::new()),
            &["BMS_NONEXISTENT_VAR_ABC"],
            Some("default_value".to_string()),
        );
        assert_eq!(result, Some("default_value".to_string()));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(temp_dir.path().join("analytics.toml")).unwrap();

        assert!(!manager.exists());
        assert_eq!(manager.get(), AnalyticsSettings::default());
    }

    #[test]
    fn test_update_and_reload_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("analytics.toml");
        let manager = SettingsManager::with_path(&path).unwrap();

        let mut settings = manager.get();
        settings.app.app_name = Some("Test app".to_string());
        settings.tracking.enabled = false;
        manager.update(settings.clone()).unwrap();

        let reopened = SettingsManager::with_path(&path).unwrap();
        assert_eq!(reopened.get(), settings);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_env_reference_resolved_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.toml");
        std::fs::write(&path, "[app]\napi_key = \"$BMS_LOADER_TEST_KEY\"\n").unwrap();
        std::env::set_var("BMS_LOADER_TEST_KEY", "secret");

        let manager = SettingsManager::with_path(&path).unwrap();
        assert_eq!(manager.get().app.api_key.as_deref(), Some("secret"));

        std::env::remove_var("BMS_LOADER_TEST_KEY");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.toml");
        std::fs::write(&path, "[tracking\nenabled = ").unwrap();

        assert!(SettingsManager::with_path(&path).is_err());
    }

    #[test]
    fn test_get_value() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(temp_dir.path().join("a.toml")).unwrap();

        assert_eq!(
            manager.get_value("tracking.enabled").unwrap(),
            serde_json::json!(true)
        );
        assert_eq!(
            manager.get_value("advanced.log_level").unwrap(),
            serde_json::json!("info")
        );
        assert!(manager.get_value("tracking.nope").is_err());
    }

    #[test]
    fn test_ensure_settings_file_writes_parseable_template() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(temp_dir.path().join("analytics.toml")).unwrap();

        assert!(manager.ensure_settings_file().unwrap());
        assert!(!manager.ensure_settings_file().unwrap());

        manager.reload().unwrap();
        assert_eq!(manager.get().version, 1);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(temp_dir.path().join("a.toml")).unwrap();

        let mut settings = manager.get();
        settings.advanced.log_level = "trace".to_string();
        manager.update(settings).unwrap();

        manager.reset().unwrap();
        assert_eq!(manager.get().advanced.log_level, "info");
    }

    #[test]
    fn test_unset_env_reference_becomes_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.toml");
        std::fs::write(
            &path,
            "[app]\napp_name = \"$BMS_UNSET_APP_NAME_XYZ\"\napi_key = \"${BMS_UNSET_API_KEY_XYZ}\"\n",
        )
        .unwrap();

        let manager = SettingsManager::with_path(&path).unwrap();
        let settings = manager.get();
        assert!(settings.app.app_name.is_none());
        assert!(settings.app.api_key.is_none());

        let analytics = crate::Analytics::from_settings(crate::Platform::headless(), &settings);
        assert!(analytics.api_key().is_none());
        assert!(analytics.config().app_name.is_none());
    }

    #[test]
    fn test_update_keeps_env_references_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analytics.toml");
        std::fs::write(
            &path,
            "[app]\napi_key = \"$BMS_UPDATE_TEST_KEY\"\nbundle_id = \"$BMS_UPDATE_UNSET_XYZ\"\n",
        )
        .unwrap();
        std::env::set_var("BMS_UPDATE_TEST_KEY", "super-secret");

        let manager = SettingsManager::with_path(&path).unwrap();
        let mut settings = manager.get();
        assert_eq!(settings.app.api_key.as_deref(), Some("super-secret"));
        settings.tracking.enabled = false;
        manager.update(settings).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("super-secret"));
        assert!(written.contains("$BMS_UPDATE_TEST_KEY"));
        assert!(written.contains("$BMS_UPDATE_UNSET_XYZ"));
        assert_eq!(manager.get().app.api_key.as_deref(), Some("super-secret"));
        assert!(!manager.get().tracking.enabled);

        // An explicit new value replaces the reference
        let mut settings = manager.get();
        settings.app.api_key = Some("typed-in".to_string());
        manager.update(settings).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("typed-in"));
        assert!(!written.contains("$BMS_UPDATE_TEST_KEY"));

        std::env::remove_var("BMS_UPDATE_TEST_KEY");
    }
}
