//! Response-time metadata: timing and size of one HTTP exchange.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{keys, Metadata};
use crate::network::{ReceivedResponse, TrackedRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMetadata {
    #[serde(rename = "$category")]
    pub category: String,
    #[serde(rename = "$trackingid")]
    pub tracking_id: String,
    /// Request send time (ms since epoch)
    #[serde(rename = "$outboundTimestamp")]
    pub outbound_timestamp: i64,
    /// Response receipt time (ms since epoch)
    #[serde(rename = "$inboundTimestamp")]
    pub inbound_timestamp: i64,
    #[serde(rename = "$roundTripTime")]
    pub round_trip_time: i64,
    #[serde(rename = "$responseCode", default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(rename = "$path")]
    pub path: String,
    #[serde(rename = "$bytesSent", default, skip_serializing_if = "Option::is_none")]
    pub bytes_sent: Option<usize>,
    #[serde(rename = "$bytesReceived")]
    pub bytes_received: usize,
}

impl InboundMetadata {
    /// Build the record for `request`/`response` as received at
    /// `inbound_timestamp`.
    pub fn compose(
        request: &dyn TrackedRequest,
        response: &dyn ReceivedResponse,
        url: &str,
        inbound_timestamp: i64,
    ) -> Self {
        let outbound_timestamp = request.start_time();
        let round_trip_time = inbound_timestamp - outbound_timestamp;

        if round_trip_time <= 0 {
            tracing::warn!(
                "[metadata] Non-positive round trip time {}ms for {} (tracking id {})",
                round_trip_time,
                url,
                request.tracking_id()
            );
        }
        if response.is_redirect() {
            tracing::trace!("[metadata] Response for {} is a redirect", url);
        }

        Self {
            category: keys::CATEGORY_NETWORK.to_string(),
            tracking_id: request.tracking_id().to_string(),
            outbound_timestamp,
            inbound_timestamp,
            round_trip_time,
            response_code: response.status_code(),
            path: url.to_string(),
            bytes_sent: request.body_len(),
            bytes_received: response.payload().map_or(0, <[u8]>::len),
        }
    }

    /// The record as a backend key/value map.
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(keys::KEY_CATEGORY.to_string(), json!(self.category));
        metadata.insert(keys::KEY_TRACKING_ID.to_string(), json!(self.tracking_id));
        metadata.insert(
            keys::KEY_OUTBOUND_TIMESTAMP.to_string(),
            json!(self.outbound_timestamp),
        );
        metadata.insert(
            keys::KEY_INBOUND_TIMESTAMP.to_string(),
            json!(self.inbound_timestamp),
        );
        metadata.insert(
            keys::KEY_ROUND_TRIP_TIME.to_string(),
            json!(self.round_trip_time),
        );
        if let Some(code) = self.response_code {
            metadata.insert(keys::KEY_RESPONSE_CODE.to_string(), json!(code));
        }
        metadata.insert(keys::KEY_PATH.to_string(), json!(self.path));
        if let Some(sent) = self.bytes_sent {
            metadata.insert(keys::KEY_BYTES_SENT.to_string(), json!(sent));
        }
        metadata.insert(
            keys::KEY_BYTES_RECEIVED.to_string(),
            json!(self.bytes_received),
        );
        metadata
    }
}
