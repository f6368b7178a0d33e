//! Decoding of the AIS stream JSON envelope.
//!
//! The streaming service delivers one JSON object per message:
//!
//! ```text
//! {
//!   "MessageType": "PositionReport",
//!   "MetaData": { "MMSI": 244660000, "time_utc": "2024-03-01 10:16:29.474 +0000 UTC", ... },
//!   "Message": {
//!     "PositionReport": {
//!       "Latitude": 51.9, "Longitude": 4.3, "Cog": 90.1, "Sog": 11.2,
//!       "RateOfTurn": 0, "PositionAccuracy": true, ...
//!     }
//!   }
//! }
//! ```
//!
//! Only `PositionReport` messages are turned into [`PositionReport`]s; every other message type
//! decodes to `Ok(None)`. AIS "not available" sentinels are mapped to `None`.
use hifitime::Epoch;
use serde::Deserialize;

use crate::atlas_errors::AtlasError;
use crate::constants::VesselId;
use crate::reports::{parse_utc, PositionReport};

/// Longitude sentinel meaning "not available".
const LON_NOT_AVAILABLE: f64 = 181.0;
/// Latitude sentinel meaning "not available".
const LAT_NOT_AVAILABLE: f64 = 91.0;
/// Course over ground sentinel meaning "not available".
const COG_NOT_AVAILABLE: f64 = 360.0;
/// Speed over ground sentinel meaning "not available".
const SOG_NOT_AVAILABLE: f64 = 102.3;
/// Rate of turn sentinel meaning "not available".
const ROT_NOT_AVAILABLE: f64 = -128.0;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "MessageType")]
    message_type: String,
    #[serde(rename = "MetaData")]
    meta: MetaData,
    #[serde(rename = "Message")]
    message: Body,
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "MMSI")]
    mmsi: u32,
    #[serde(default)]
    time_utc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(rename = "PositionReport", default)]
    position_report: Option<RawPositionReport>,
}

#[derive(Debug, Deserialize)]
struct RawPositionReport {
    #[serde(rename = "Latitude", default)]
    latitude: Option<f64>,
    #[serde(rename = "Longitude", default)]
    longitude: Option<f64>,
    #[serde(rename = "Cog", default)]
    cog: Option<f64>,
    #[serde(rename = "Sog", default)]
    sog: Option<f64>,
    #[serde(rename = "RateOfTurn", default)]
    rate_of_turn: Option<f64>,
    #[serde(rename = "PositionAccuracy", default)]
    position_accuracy: Option<bool>,
}

fn available(value: Option<f64>, sentinel: f64) -> Option<f64> {
    value.filter(|v| (v - sentinel).abs() > 1e-9)
}

/// Decode one AIS stream message.
///
/// Arguments
/// -----------------
/// * `json`: the raw message text.
/// * `received`: fallback timestamp used when the envelope carries no parsable `time_utc`.
///
/// Return
/// ----------
/// * `Ok(Some(report))` for a `PositionReport` message.
/// * `Ok(None)` for any other message type.
/// * `Err(AtlasError::JsonError)` if the text is not a valid envelope.
pub fn decode_ais_message(json: &str, received: Epoch) -> Result<Option<PositionReport>, AtlasError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.message_type != "PositionReport" {
        return Ok(None);
    }
    let Some(raw) = envelope.message.position_report else {
        return Ok(None);
    };

    let time = envelope
        .meta
        .time_utc
        .as_deref()
        .and_then(|t| parse_utc(t).ok())
        .unwrap_or(received);

    Ok(Some(PositionReport {
        vessel_id: VesselId(envelope.meta.mmsi),
        time,
        longitude: available(raw.longitude, LON_NOT_AVAILABLE),
        latitude: available(raw.latitude, LAT_NOT_AVAILABLE),
        course_over_ground: available(raw.cog, COG_NOT_AVAILABLE),
        speed_over_ground: available(raw.sog, SOG_NOT_AVAILABLE),
        turn_rate: available(raw.rate_of_turn, ROT_NOT_AVAILABLE),
        // Older feeds omit the flag; absence is not a rejection.
        position_accurate: raw.position_accuracy.unwrap_or(true),
    }))
}

#[cfg(test)]
mod ais_message_test {
    use super::*;

    const MESSAGE: &str = r#"{
        "MessageType": "PositionReport",
        "MetaData": {"MMSI": 244660000, "ShipName": "ARGO", "time_utc": "2024-03-01 10:16:29.474218962 +0000 UTC"},
        "Message": {"PositionReport": {
            "Latitude": 51.9, "Longitude": 4.3, "Cog": 360, "Sog": 11.2,
            "RateOfTurn": -128, "PositionAccuracy": true, "TrueHeading": 511
        }}
    }"#;

    #[test]
    fn test_decode_position_report() {
        let received = Epoch::from_gregorian_utc_at_midnight(2000, 1, 1);
        let report = decode_ais_message(MESSAGE, received).unwrap().unwrap();

        assert_eq!(report.vessel_id, VesselId(244_660_000));
        assert_eq!(report.longitude, Some(4.3));
        assert_eq!(report.latitude, Some(51.9));
        assert_eq!(report.course_over_ground, None);
        assert_eq!(report.speed_over_ground, Some(11.2));
        assert_eq!(report.turn_rate, None);
        assert!(report.position_accurate);
        assert_eq!(
            report.time,
            Epoch::from_gregorian_utc(2024, 3, 1, 10, 16, 29, 474_218_962)
        );
    }

    #[test]
    fn test_other_message_types_are_ignored() {
        let json = r#"{"MessageType": "ShipStaticData", "MetaData": {"MMSI": 1}, "Message": {}}"#;
        let received = Epoch::from_gregorian_utc_at_midnight(2000, 1, 1);
        assert_eq!(decode_ais_message(json, received).unwrap(), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        let received = Epoch::from_gregorian_utc_at_midnight(2000, 1, 1);
        assert!(matches!(
            decode_ais_message("{not json", received),
            Err(AtlasError::JsonError(_))
        ));
    }
}
