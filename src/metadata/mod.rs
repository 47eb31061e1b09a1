//! Metadata attached to outbound requests and recorded for inbound
//! responses.

pub mod inbound;
pub mod keys;
pub mod outbound;

use std::sync::Arc;

pub use inbound::InboundMetadata;
pub use outbound::OutboundMetadata;

use crate::error::Result;
use crate::identity::DeviceIdentity;
use crate::network::{ReceivedResponse, TrackedRequest};
use crate::platform::{Clock, DeviceInfoProvider};

/// Free-form analytics key/value payload.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Builds request and response metadata from platform lookups.
pub struct MetadataComposer {
    device: Arc<dyn DeviceInfoProvider>,
    identity: Arc<DeviceIdentity>,
    clock: Arc<dyn Clock>,
}

impl MetadataComposer {
    pub fn new(
        device: Arc<dyn DeviceInfoProvider>,
        identity: Arc<DeviceIdentity>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            device,
            identity,
            clock,
        }
    }

    /// The configured app name, else the bundle identifier, else nothing.
    pub fn resolve_app_name(&self, configured: Option<&str>) -> Option<String> {
        configured
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| self.device.bundle_identifier())
    }

    pub fn outbound_request_metadata(&self, app_name: Option<&str>) -> Result<OutboundMetadata> {
        let device = self.device.device_info();

        Ok(OutboundMetadata {
            os: device.os,
            brand: device.brand,
            model: device.model,
            os_version: device.os_version,
            app_name: self.resolve_app_name(app_name),
            device_id: self.identity.unique_device_id()?,
        })
    }

    /// Outbound metadata serialized to JSON.
    ///
    /// Fails only if the device identifier can't be read or persisted.
    pub fn generate_outbound_request_metadata(&self, app_name: Option<&str>) -> Result<String> {
        let metadata = self.outbound_request_metadata(app_name)?;
        if metadata.app_name.is_none() {
            tracing::debug!("[metadata] No app name configured, omitting mfpAppName");
        }
        metadata.to_json()
    }

    /// Timing and size metadata for a completed exchange, stamped with the
    /// current time.
    pub fn generate_inbound_response_metadata(
        &self,
        request: &dyn TrackedRequest,
        response: &dyn ReceivedResponse,
        url: &str,
    ) -> InboundMetadata {
        InboundMetadata::compose(request, response, url, self.clock.now_millis())
    }
}
