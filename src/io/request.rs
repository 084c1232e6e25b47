//! Boundary validation for inbound location payloads
//!
//! The engine only ever sees validated events. This module turns a raw JSON
//! body into a `LocationEvent` or a client-facing `ValidationError`.

use crate::domain::{LocationEvent, VehicleId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Fields that must be present, checked in this order
const REQUIRED_FIELDS: [&str; 3] = ["vehicle_id", "latitude", "longitude"];

/// Client errors for a location payload; `Display` is the message returned
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("No JSON data provided")]
    NoData,

    #[error("Invalid JSON body")]
    MalformedJson,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("vehicle_id must be a non-empty string")]
    InvalidVehicleId,

    #[error("Invalid latitude or longitude")]
    InvalidCoordinates,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,
}

/// Parse and validate a raw request body
pub fn parse_location_body(body: &[u8]) -> Result<LocationEvent, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::NoData);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::MalformedJson)?;
    validate_location(&value)
}

/// Validate an already-decoded JSON payload
pub fn validate_location(value: &Value) -> Result<LocationEvent, ValidationError> {
    let Some(obj) = value.as_object().filter(|o| !o.is_empty()) else {
        return Err(ValidationError::NoData);
    };

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            return Err(ValidationError::MissingField(field));
        }
    }

    let vehicle_id = coerce_vehicle_id(&obj["vehicle_id"])?;

    let (Some(latitude), Some(longitude)) =
        (coerce_f64(&obj["latitude"]), coerce_f64(&obj["longitude"]))
    else {
        return Err(ValidationError::InvalidCoordinates);
    };

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::LongitudeOutOfRange);
    }

    let timestamp = match obj.get("timestamp") {
        None | Some(Value::Null) => Utc::now(),
        Some(raw) => raw.as_str().and_then(parse_timestamp).unwrap_or_else(|| {
            warn!(vehicle_id = %vehicle_id, timestamp = %raw, "invalid_timestamp_using_now");
            Utc::now()
        }),
    };

    Ok(LocationEvent::new(vehicle_id, latitude, longitude, timestamp))
}

/// Strings are taken as-is, numbers are stringified
fn coerce_vehicle_id(value: &Value) -> Result<VehicleId, ValidationError> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(ValidationError::InvalidVehicleId),
    };
    if id.is_empty() {
        return Err(ValidationError::InvalidVehicleId);
    }
    Ok(VehicleId(id))
}

/// JSON numbers or numeric strings; NaN never passes the range checks
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`, offsets), a naive ISO-8601
/// date-time or a bare date (midnight). Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_valid_payload() {
        let event = validate_location(&json!({
            "vehicle_id": "truck-1",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "timestamp": "2024-05-01T12:30:00Z"
        }))
        .unwrap();

        assert_eq!(event.vehicle_id.as_str(), "truck-1");
        assert_eq!(event.latitude, 37.7749);
        assert_eq!(event.longitude, -122.4194);
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(parse_location_body(b""), Err(ValidationError::NoData));
        assert_eq!(parse_location_body(b"  \n"), Err(ValidationError::NoData));
        assert_eq!(parse_location_body(b"{}"), Err(ValidationError::NoData));
        assert_eq!(parse_location_body(b"null"), Err(ValidationError::NoData));
    }

    #[test]
    fn test_malformed_json() {
        assert_eq!(parse_location_body(b"{\"vehicle_id\":"), Err(ValidationError::MalformedJson));
    }

    #[test]
    fn test_missing_fields_in_order() {
        let err = validate_location(&json!({"latitude": 1.0})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("vehicle_id"));
        assert_eq!(err.to_string(), "Missing required field: vehicle_id");

        let err = validate_location(&json!({"vehicle_id": "v", "latitude": 1.0})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("longitude"));
    }

    #[test]
    fn test_numeric_strings_and_ids_are_coerced() {
        let event = validate_location(&json!({
            "vehicle_id": 1042,
            "latitude": "37.5",
            "longitude": " -122.25 "
        }))
        .unwrap();
        assert_eq!(event.vehicle_id.as_str(), "1042");
        assert_eq!(event.latitude, 37.5);
        assert_eq!(event.longitude, -122.25);
    }

    #[test]
    fn test_invalid_coordinates() {
        let err = validate_location(&json!({
            "vehicle_id": "v", "latitude": "north", "longitude": 0
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidCoordinates);

        let err = validate_location(&json!({
            "vehicle_id": "v", "latitude": 0, "longitude": null
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidCoordinates);
    }

    #[test]
    fn test_out_of_range() {
        let lat = validate_location(&json!({"vehicle_id": "v", "latitude": 90.5, "longitude": 0}));
        assert_eq!(lat.unwrap_err().to_string(), "Latitude must be between -90 and 90");

        let lon = validate_location(&json!({"vehicle_id": "v", "latitude": 0, "longitude": -181}));
        assert_eq!(lon.unwrap_err().to_string(), "Longitude must be between -180 and 180");

        let nan = validate_location(&json!({"vehicle_id": "v", "latitude": "NaN", "longitude": 0}));
        assert_eq!(nan.unwrap_err(), ValidationError::LatitudeOutOfRange);
    }

    #[test]
    fn test_range_edges_are_accepted() {
        assert!(validate_location(&json!({"vehicle_id": "v", "latitude": -90, "longitude": 180}))
            .is_ok());
    }

    #[test]
    fn test_blank_vehicle_id_rejected() {
        for id in [json!(""), json!("   "), json!(null), json!({"id": 1})] {
            let err = validate_location(&json!({"vehicle_id": id, "latitude": 0, "longitude": 0}))
                .unwrap_err();
            assert_eq!(err, ValidationError::InvalidVehicleId);
        }
    }

    #[test]
    fn test_bad_timestamp_falls_back_to_now() {
        let before = Utc::now();
        let event = validate_location(&json!({
            "vehicle_id": "v", "latitude": 0, "longitude": 0, "timestamp": "yesterday-ish"
        }))
        .unwrap();
        assert!(event.timestamp >= before);

        let event = validate_location(&json!({
            "vehicle_id": "v", "latitude": 0, "longitude": 0, "timestamp": 12345
        }))
        .unwrap();
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30"), Some(expected));
        assert_eq!(parse_timestamp("05/01/2024"), None);
    }

    #[test]
    fn test_date_only_timestamp_is_midnight_utc() {
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01"), Some(midnight));
        assert_eq!(parse_timestamp("2024-13-01"), None);

        let event = validate_location(&json!({
            "vehicle_id": "v", "latitude": 0, "longitude": 0, "timestamp": "2024-05-01"
        }))
        .unwrap();
        assert_eq!(event.timestamp, midnight);
    }
}
