//! CLI execution runner.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analytics::{Analytics, DeviceEvent};
use crate::platform::Platform;
use crate::session::AnalyticsEvent;
use crate::settings::{AnalyticsSettings, SettingsManager};

use super::args::Args;

/// Everything one CLI invocation found out.
#[derive(Debug, Serialize)]
pub struct Report {
    pub settings_path: PathBuf,
    pub app_name: Option<String>,
    pub initialized: bool,
    pub device_id: String,
    pub outbound_metadata: serde_json::Value,
    pub events: Vec<AnalyticsEvent>,
}

/// Install the tracing subscriber. `--verbose` wins over the settings
/// log level; `RUST_LOG` adds to either.
pub fn init_logging(args: &Args, settings: &AnalyticsSettings) {
    let level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match format!("bms_analytics={}", level).parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("[cli] Ignoring invalid log level '{}': {}", level, e),
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open the settings file named on the command line, or the default one.
pub fn open_settings(args: &Args) -> Result<SettingsManager> {
    match &args.settings {
        Some(path) => SettingsManager::with_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => {
            let manager = SettingsManager::new().context("Failed to initialize settings manager")?;
            if let Err(e) = manager.ensure_settings_file() {
                tracing::warn!("[cli] Failed to create settings template: {}", e);
            }
            Ok(manager)
        }
    }
}

/// Command-line values on top of the file.
fn apply_overrides(args: &Args, mut settings: AnalyticsSettings) -> AnalyticsSettings {
    if let Some(app_name) = &args.app_name {
        settings.app.app_name = Some(app_name.clone());
    }
    if let Some(api_key) = &args.api_key {
        settings.app.api_key = Some(api_key.clone());
    }
    if let Some(store) = &args.store {
        settings.storage.path = Some(store.to_string_lossy().into_owned());
    }
    if args.session && !settings.tracking.device_events.contains(&DeviceEvent::Lifecycle) {
        settings.tracking.device_events.push(DeviceEvent::Lifecycle);
    }
    settings
}

/// Build analytics from settings plus flags and collect a report.
pub fn run(args: &Args, manager: &SettingsManager) -> Result<Report> {
    let settings = apply_overrides(args, manager.get());
    let analytics = Analytics::from_settings(Platform::host(), &settings);

    if args.reset_device_id {
        analytics
            .reset_device_id()
            .context("Failed to reset device id")?;
    }

    let device_id = analytics
        .unique_device_id()
        .context("Failed to resolve device id")?;
    let outbound = analytics
        .outbound_request_metadata()
        .context("Failed to compose outbound metadata")?;

    if args.session {
        if !analytics.sessions().is_active() {
            // Not initialized, so initialization didn't open one
            analytics.log_session_start();
        }
        analytics.log_session_end();
    }

    Ok(Report {
        settings_path: manager.path().to_path_buf(),
        app_name: analytics.app_name(),
        initialized: analytics.api_key().is_some(),
        device_id,
        outbound_metadata: serde_json::to_value(&outbound)?,
        events: analytics.drain_events(),
    })
}

pub fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Settings:   {}", report.settings_path.display());
    println!(
        "App name:   {}",
        report.app_name.as_deref().unwrap_or("(not set)")
    );
    println!("Initialized: {}", report.initialized);
    println!("Device ID:  {}", report.device_id);
    println!("Outbound:   {}", report.outbound_metadata);
    for event in &report.events {
        println!(
            "Event {} @ {}: {}",
            event.id,
            event.timestamp,
            serde_json::Value::Object(event.metadata.clone())
        );
    }
    Ok(())
}
