// ── Telemetry normalization ──
//
// Turns a raw device record into typed readings. The vendor nests the
// reading and the settings as JSON documents serialized into strings; each
// is decoded on its own and every field is read independently, so a broken
// document or a missing key only blanks the fields it would have supplied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use govee_api::Device;

/// One device's latest readings.
///
/// Absence is meaningful: `None` means "no reading", which is not the same
/// as a reading of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Degrees Celsius, one decimal place.
    pub temperature: Option<f64>,
    /// Raw humidity divided by 100.
    pub humidity: Option<f64>,
    /// Battery percentage.
    pub battery: Option<u8>,
    pub online: bool,
    /// Vendor's last-update stamp, epoch milliseconds, as reported.
    pub last_update: Option<i64>,
}

impl TelemetrySnapshot {
    /// `last_update` as an instant.
    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        self.last_update.and_then(DateTime::from_timestamp_millis)
    }
}

/// A thermometer as consumers see it: stable identity plus readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thermometer {
    /// Device MAC; stable across poll cycles.
    pub mac: String,
    pub name: String,
    pub sku: String,
    pub firmware_version: Option<String>,
    pub hardware_version: Option<String>,
    pub telemetry: TelemetrySnapshot,
}

impl Thermometer {
    pub fn from_device(device: &Device) -> Self {
        Self {
            mac: device.device.clone(),
            name: device.display_name().to_owned(),
            sku: device.sku.clone(),
            firmware_version: device.version_soft.clone(),
            hardware_version: device.version_hard.clone(),
            telemetry: extract(device),
        }
    }
}

/// Hundredths of a degree Celsius to degrees, rounded to one decimal.
///
/// Rounds the exact binary value of `raw / 100`, ties to even, so
/// `2125` is `21.2` and `2145` (stored just below `21.45`) is `21.4`.
pub fn normalize_temperature(raw: Option<f64>) -> Option<f64> {
    raw.and_then(|t| format!("{:.1}", t / 100.0).parse().ok())
}

/// Raw humidity divided by 100. Zero is the vendor's "no reading".
pub fn normalize_humidity(raw: Option<f64>) -> Option<f64> {
    raw.filter(|h| *h != 0.0).map(|h| h / 100.0)
}

/// Normalize one device record. Never fails.
pub fn extract(device: &Device) -> TelemetrySnapshot {
    let reading = embedded_document(device.device_ext.last_device_data.as_ref());
    let settings = embedded_document(device.device_ext.device_settings.as_ref());

    let number = |doc: &Option<Map<String, Value>>, key: &str| {
        doc.as_ref().and_then(|d| d.get(key)).and_then(Value::as_f64)
    };

    TelemetrySnapshot {
        temperature: normalize_temperature(number(&reading, "tem")),
        humidity: normalize_humidity(number(&reading, "hum")),
        battery: settings
            .as_ref()
            .and_then(|d| d.get("battery"))
            .and_then(Value::as_u64)
            .and_then(|b| u8::try_from(b).ok()),
        online: reading
            .as_ref()
            .and_then(|d| d.get("online"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        last_update: reading
            .as_ref()
            .and_then(|d| d.get("lastTime"))
            .and_then(Value::as_i64),
    }
}

/// Decode an embedded document that is either a JSON string holding an
/// object, or an object already.
fn embedded_document(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value? {
        Value::String(s) => match serde_json::from_str(s) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        Value::Object(map) => Some(map.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use govee_api::DeviceExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn device_with(last: Option<Value>, settings: Option<Value>) -> Device {
        Device {
            device: "AA:BB:CC:DD:EE:FF:00:11".into(),
            sku: "H5111".into(),
            device_name: Some("Greenhouse".into()),
            version_hard: Some("1.00.01".into()),
            version_soft: Some("1.00.16".into()),
            device_ext: DeviceExt {
                last_device_data: last,
                device_settings: settings,
            },
        }
    }

    #[test]
    fn temperature_is_hundredths_rounded_to_one_decimal() {
        for (raw, expected) in [
            (2150.0, 21.5),
            (2163.0, 21.6),
            (2141.0, 21.4),
            (0.0, 0.0),
            (-512.0, -5.1),
            (-1.0, 0.0),
            (2125.0, 21.2),
            (2135.0, 21.4),
            (2145.0, 21.4),
            (-2145.0, -21.4),
        ] {
            assert_eq!(normalize_temperature(Some(raw)), Some(expected), "raw {raw}");
        }
        assert_eq!(normalize_temperature(None), None);
    }

    #[test]
    fn humidity_zero_means_absent() {
        assert_eq!(normalize_humidity(Some(4500.0)), Some(45.0));
        assert_eq!(normalize_humidity(Some(1.0)), Some(0.01));
        assert_eq!(normalize_humidity(Some(0.0)), None);
        assert_eq!(normalize_humidity(None), None);
    }

    #[test]
    fn extracts_full_record() {
        let device = device_with(
            Some(json!(
                "{\"online\":true,\"tem\":2163,\"hum\":4870,\"lastTime\":1700000000000}"
            )),
            Some(json!("{\"battery\":87,\"wifiName\":\"home\"}")),
        );

        let snapshot = extract(&device);
        assert_eq!(
            snapshot,
            TelemetrySnapshot {
                temperature: Some(21.6),
                humidity: Some(48.7),
                battery: Some(87),
                online: true,
                last_update: Some(1_700_000_000_000),
            }
        );
        assert_eq!(
            snapshot.last_update_at(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn missing_ext_yields_empty_snapshot() {
        let snapshot = extract(&device_with(None, None));
        assert_eq!(snapshot, TelemetrySnapshot::default());
        assert!(!snapshot.online);
    }

    #[test]
    fn broken_reading_does_not_blank_settings() {
        let device = device_with(Some(json!("{not json")), Some(json!("{\"battery\":55}")));
        let snapshot = extract(&device);
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.humidity, None);
        assert_eq!(snapshot.battery, Some(55));
        assert!(!snapshot.online);
    }

    #[test]
    fn wrongly_typed_fields_are_absent_individually() {
        let device = device_with(
            Some(json!("{\"tem\":\"hot\",\"hum\":3000,\"online\":\"yes\"}")),
            Some(json!("{\"battery\":900}")),
        );
        let snapshot = extract(&device);
        assert_eq!(snapshot.temperature, None);
        assert_eq!(snapshot.humidity, Some(30.0));
        assert!(!snapshot.online);
        assert_eq!(snapshot.battery, None);
    }

    #[test]
    fn accepts_already_decoded_documents() {
        let device = device_with(Some(json!({ "tem": 1999 })), Some(json!({ "battery": 12 })));
        let snapshot = extract(&device);
        assert_eq!(snapshot.temperature, Some(20.0));
        assert_eq!(snapshot.battery, Some(12));
    }

    #[test]
    fn thermometer_carries_identity() {
        let device = device_with(Some(json!("{\"tem\":2000}")), None);
        let thermometer = Thermometer::from_device(&device);
        assert_eq!(thermometer.mac, "AA:BB:CC:DD:EE:FF:00:11");
        assert_eq!(thermometer.name, "Greenhouse");
        assert_eq!(thermometer.firmware_version.as_deref(), Some("1.00.16"));
        assert_eq!(thermometer.telemetry.temperature, Some(20.0));
    }
}
