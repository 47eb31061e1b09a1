//! CLI argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

/// Headless diagnostics for the analytics SDK
#[derive(Parser, Debug, Clone)]
#[command(name = "bms-analytics-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Settings file (default: ~/.bms/analytics.toml)
    #[arg(short = 's', long)]
    pub settings: Option<PathBuf>,

    /// App name (overrides settings)
    #[arg(short = 'a', long)]
    pub app_name: Option<String>,

    /// API key (overrides settings)
    #[arg(long, env = "BMS_ANALYTICS_API_KEY")]
    pub api_key: Option<String>,

    /// Key-value store file holding the device identifier
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Forget the persisted device identifier before doing anything else
    #[arg(long)]
    pub reset_device_id: bool,

    /// Run a demo session and print the recorded events
    #[arg(long)]
    pub session: bool,

    /// Output as JSON (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
