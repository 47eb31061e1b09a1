//! Headless diagnostics for the analytics SDK.
//!
//! # Usage
//!
//! ```bash
//! cargo build --features cli --bin bms-analytics-cli
//!
//! # Device id and outbound metadata from ~/.bms/analytics.toml
//! ./target/debug/bms-analytics-cli
//!
//! # Override identity, run a demo session, emit JSON
//! ./target/debug/bms-analytics-cli -a "My App" --api-key 1234 --session --json | jq .
//! ```

use anyhow::Result;
use clap::Parser;

use bms_analytics::cli::{init_logging, open_settings, print_report, run, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    let manager = open_settings(&args)?;
    init_logging(&args, &manager.get());

    if args.verbose {
        eprintln!("[cli] Settings loaded from {}", manager.path().display());
    }

    let report = run(&args, &manager)?;
    print_report(&report, args.json)
}
