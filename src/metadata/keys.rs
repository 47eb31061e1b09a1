//! Metadata field names understood by the analytics backend.
//!
//! These strings are wire format; changing any of them breaks ingestion.

// Lifecycle
pub const KEY_SESSION_ID: &str = "sessionId";
pub const KEY_CATEGORY: &str = "$category";
pub const KEY_TIMESTAMP: &str = "$timestamp";
pub const KEY_DURATION: &str = "$duration";
pub const KEY_CLOSED_BY: &str = "$closedBy";

pub const CATEGORY_APP_SESSION: &str = "appSession";
pub const CATEGORY_NETWORK: &str = "network";

// Outbound
pub const KEY_OS: &str = "os";
pub const KEY_BRAND: &str = "brand";
pub const KEY_MODEL: &str = "model";
pub const KEY_OS_VERSION: &str = "osVersion";
pub const KEY_APP_NAME: &str = "mfpAppName";
pub const KEY_DEVICE_ID: &str = "deviceID";

// Inbound
pub const KEY_TRACKING_ID: &str = "$trackingid";
pub const KEY_OUTBOUND_TIMESTAMP: &str = "$outboundTimestamp";
pub const KEY_INBOUND_TIMESTAMP: &str = "$inboundTimestamp";
pub const KEY_ROUND_TRIP_TIME: &str = "$roundTripTime";
pub const KEY_RESPONSE_CODE: &str = "$responseCode";
pub const KEY_PATH: &str = "$path";
pub const KEY_BYTES_SENT: &str = "$bytesSent";
pub const KEY_BYTES_RECEIVED: &str = "$bytesReceived";

/// Request header carrying the serialized outbound metadata.
pub const OUTBOUND_METADATA_HEADER: &str = "x-mfp-analytics-metadata";
