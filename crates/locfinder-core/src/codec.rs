//! Location event codec
//!
//! One stream message carries one JSON record:
//!
//! ```json
//! {"name": "Taco Cart", "latitude": 37.78, "longitude": -122.43}
//! ```

use serde::Deserialize;

use crate::error::DecodeError;
use crate::models::LocationEvent;

/// Wire shape with every field optional so absent fields can be reported by name
#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Stateless converter between raw stream payloads and `LocationEvent`s
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationEventCodec;

impl LocationEventCodec {
    /// Parse a single raw message
    pub fn decode(raw: &str) -> Result<LocationEvent, DecodeError> {
        let record: RawLocation = serde_json::from_str(raw)?;

        let name = record.name.ok_or(DecodeError::MissingField("name"))?;
        let latitude = record
            .latitude
            .ok_or(DecodeError::MissingField("latitude"))?;
        let longitude = record
            .longitude
            .ok_or(DecodeError::MissingField("longitude"))?;

        Ok(LocationEvent {
            name,
            latitude,
            longitude,
        })
    }

    /// Serialize an event into the wire format
    pub fn encode(event: &LocationEvent) -> Result<String, DecodeError> {
        Ok(serde_json::to_string(event)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_decode_round_trip() {
        let event = LocationEvent::new("Taco Cart", 37.78, -122.43);
        let raw = LocationEventCodec::encode(&event).unwrap();
        let decoded = LocationEventCodec::decode(&raw).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let raw = r#"{"name":"Curry Up","latitude":37.7,"longitude":-122.4,"id":"abc"}"#;
        let event = LocationEventCodec::decode(raw).unwrap();
        assert_eq!(event, LocationEvent::new("Curry Up", 37.7, -122.4));
    }

    #[rstest]
    #[case(r#"{"name":"Taco Cart","longitude":-122.43}"#, "latitude")]
    #[case(r#"{"name":"Taco Cart","latitude":37.78}"#, "longitude")]
    #[case(r#"{"latitude":37.78,"longitude":-122.43}"#, "name")]
    #[case(r#"{"name":null,"latitude":37.78,"longitude":-122.43}"#, "name")]
    fn test_decode_missing_field(#[case] raw: &str, #[case] field: &str) {
        match LocationEventCodec::decode(raw) {
            Err(DecodeError::MissingField(missing)) => assert_eq!(missing, field),
            other => panic!("expected MissingField({}), got {:?}", field, other),
        }
    }

    #[rstest]
    #[case("not json")]
    #[case("")]
    #[case("[1, 2, 3]")]
    #[case(r#"{"name":"Taco Cart","latitude":"north","longitude":-122.43}"#)]
    #[case(r#"{"name":42,"latitude":37.78,"longitude":-122.43}"#)]
    fn test_decode_malformed(#[case] raw: &str) {
        let err = LocationEventCodec::decode(raw).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)), "got {:?}", err);
    }
}
