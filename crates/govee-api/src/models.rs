// Govee API request and response types
//
// Responses are modeled with optional fields throughout: the app API is
// undocumented and field presence varies between accounts and firmware.
// Anything we don't read is ignored by serde.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The only device model this client keeps from the device list.
pub const THERMOMETER_SKU: &str = "H5111";

// ── Login ────────────────────────────────────────────────────────────

/// Body of `POST /account/rest/account/v2/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub client: &'a str,
    pub code1: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub key: &'a str,
    pub view: u8,
    pub transaction: String,
}

/// Login response. The token lives at `client.token`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub client: Option<LoginClient>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoginClient {
    #[serde(default)]
    pub token: Option<String>,
}

// ── Device list ──────────────────────────────────────────────────────

/// Device-list response.
///
/// ```json
/// { "status": 200, "message": "success", "data": { "devices": [...] } }
/// ```
///
/// An expired token is reported as `"status": 401` in the body, usually
/// with a 200 transport status.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeviceListResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<DeviceListData>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeviceListData {
    /// Kept raw so one odd record cannot fail the whole list.
    #[serde(default)]
    pub devices: Option<Vec<Value>>,
}

impl DeviceListResponse {
    /// Whether the body reports an unauthorized (expired) token.
    pub fn is_unauthorized(&self) -> bool {
        match &self.status {
            Some(Value::Number(n)) => n.as_i64() == Some(401),
            Some(Value::String(s)) => s.trim() == "401",
            _ => false,
        }
    }

    pub fn into_devices(self) -> Vec<Value> {
        self.data.and_then(|d| d.devices).unwrap_or_default()
    }
}

/// One entry of the device list.
///
/// Each field falls back to its default when the vendor sends an
/// unexpected type, so odd metadata never drops a whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device identifier, MAC-like (`AA:BB:CC:DD:EE:FF:00:11`).
    #[serde(default, deserialize_with = "lenient")]
    pub device: String,
    /// Vendor model identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub sku: String,
    #[serde(default, deserialize_with = "lenient")]
    pub device_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version_hard: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version_soft: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub device_ext: DeviceExt,
}

/// Nested telemetry holder.
///
/// The vendor encodes both documents as JSON *strings* inside the JSON
/// response. They are kept as raw values and decoded by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceExt {
    /// Latest reading: `tem`, `hum`, `online`, `lastTime`.
    #[serde(default)]
    pub last_device_data: Option<Value>,
    /// Device settings: `battery`, among others.
    #[serde(default)]
    pub device_settings: Option<Value>,
}

/// Deserialize `T`, or its default when the value has another shape
/// (including `null`).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

impl Device {
    pub fn is_thermometer(&self) -> bool {
        self.sku == THERMOMETER_SKU
    }

    pub fn display_name(&self) -> &str {
        self.device_name.as_deref().unwrap_or(&self.device)
    }
}
