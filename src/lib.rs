//! Analytics logging for client SDKs.
//!
//! Tracks app sessions, stamps outbound requests with device and app
//! identity, and records timing metadata for responses. Transport and upload
//! live elsewhere; this crate only produces the metadata.
//!
//! ```rust,ignore
//! use bms_analytics::{Analytics, DeviceEvent, Platform};
//!
//! let analytics = Analytics::new(Platform::host());
//! analytics.initialize_with_app_name("My App", "api-key", &[DeviceEvent::Lifecycle]);
//!
//! let header = analytics.generate_outbound_request_metadata()?;
//! ```

pub mod analytics;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod network;
pub mod platform;
pub mod session;
pub mod settings;

#[cfg(feature = "cli")]
pub mod cli;


pub use analytics::{Analytics, AnalyticsConfig, DeviceEvent};
pub use error::{AnalyticsError, Result};
pub use identity::DeviceIdentity;
pub use metadata::{InboundMetadata, Metadata, MetadataComposer, OutboundMetadata};
pub use network::{ReceivedResponse, Request, Response, TrackedRequest};
pub use platform::Platform;
pub use session::{AnalyticsEvent, ClosedBy, EventLog, SessionStatus, SessionTracker};
pub use settings::{AnalyticsSettings, SettingsManager};
