//! Headless command-line front end.
//!
//! Loads settings, builds an [`Analytics`](crate::Analytics) on the host
//! platform, and prints what the SDK would attach to requests:
//!
//! ```text
//! settings.toml --> AnalyticsSettings --> Analytics --> report (text/JSON)
//!       ^ CLI flags override
//! ```

mod args;
mod runner;

pub use args::Args;
pub use runner::{init_logging, open_settings, print_report, run, Report};
