//! Request-time metadata: who is calling, from what device.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Device and app identity attached to every outbound request.
///
/// Serialized as a flat JSON object; `mfpAppName` is left out entirely when
/// no app name could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMetadata {
    pub os: String,
    pub brand: String,
    pub model: String,
    #[serde(rename = "osVersion")]
    pub os_version: String,
    #[serde(rename = "mfpAppName", default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(rename = "deviceID")]
    pub device_id: String,
}

impl OutboundMetadata {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::keys;

    fn sample(app_name: Option<&str>) -> OutboundMetadata {
        OutboundMetadata {
            os: "iOS".to_string(),
            brand: "Apple".to_string(),
            model: "Simulator".to_string(),
            os_version: "9.2".to_string(),
            app_name: app_name.map(str::to_string),
            device_id: "abc-123".to_string(),
        }
    }

    #[test]
    fn test_field_names_match_wire_keys() {
        let value = serde_json::to_value(sample(Some("Unit Test App"))).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            keys::KEY_OS,
            keys::KEY_BRAND,
            keys::KEY_MODEL,
            keys::KEY_OS_VERSION,
            keys::KEY_APP_NAME,
            keys::KEY_DEVICE_ID,
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(object.len(), 6);
    }

    #[test]
    fn test_json_contains_expected_pairs() {
        let json = sample(Some("Unit Test App")).to_json().unwrap();
        assert!(json.contains("\"os\":\"iOS\""));
        assert!(json.contains("\"brand\":\"Apple\""));
        assert!(json.contains("\"model\":\"Simulator\""));
        assert!(json.contains("\"osVersion\":\"9.2\""));
        assert!(json.contains("\"mfpAppName\":\"Unit Test App\""));
        assert!(!json.contains("\"deviceID\":\"\""));
    }

    #[test]
    fn test_missing_app_name_is_omitted() {
        let json = sample(None).to_json().unwrap();
        assert!(!json.contains("mfpAppName"));

        let parsed: OutboundMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.app_name, None);
    }
}
