//! Wire codec for `WeatherEvent`.
//!
//! Events travel as self-describing JSON text so that adding fields stays
//! backward compatible; unknown fields are ignored on decode. Timestamps are
//! ISO-8601 with second precision and no offset (naive local time).

use crate::error::DecodeError;
use crate::types::WeatherEvent;

/// Serialize an event to its transport payload.
pub fn encode(event: &WeatherEvent) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(event)
}

/// Deserialize and validate a transport payload.
///
/// Fails with `DecodeError` when the payload is not well-formed JSON, a
/// required field is absent or wrong-typed, or a field-level invariant is
/// violated. Extra fields are ignored.
pub fn decode(payload: &[u8]) -> Result<WeatherEvent, DecodeError> {
    let event: WeatherEvent = serde_json::from_slice(payload)?;
    validate(&event)?;
    Ok(event)
}

fn validate(event: &WeatherEvent) -> Result<(), DecodeError> {
    if event.city.trim().is_empty() {
        return Err(DecodeError::Invalid {
            field: "city",
            reason: "must not be empty".to_string(),
        });
    }
    if event.condition.trim().is_empty() {
        return Err(DecodeError::Invalid {
            field: "condition",
            reason: "must not be empty".to_string(),
        });
    }
    if !event.temperature_celsius.is_finite() {
        return Err(DecodeError::Invalid {
            field: "temperatureCelsius",
            reason: format!("must be finite, got {}", event.temperature_celsius),
        });
    }
    Ok(())
}

/// Serde adapter for the wire timestamp format (`2025-03-14T15:00:00`).
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }

    /// Same format for optional timestamps (absent or null on the wire).
    pub mod option {
        use super::FORMAT;
        use chrono::NaiveDateTime;
        use serde::{self, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(
            timestamp: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match timestamp {
                Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                Some(raw) => NaiveDateTime::parse_from_str(&raw, FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
