use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precipitation (millimetres per sampled hour) above which a reading is
/// classified as rain.
pub const RAIN_PRECIPITATION_THRESHOLD_MM: f64 = 0.5;

/// Classified weather condition emitted by the poller.
///
/// On the wire the condition travels as a free-form label (`WeatherEvent`
/// stores a `String`), so consumers stay forward compatible with conditions
/// this enum does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Rain,
    Clear,
}

impl WeatherCondition {
    /// Classify a precipitation reading.
    pub fn from_precipitation(precipitation_mm: f64) -> Self {
        if precipitation_mm > RAIN_PRECIPITATION_THRESHOLD_MM {
            WeatherCondition::Rain
        } else {
            WeatherCondition::Clear
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Rain => "rain",
            WeatherCondition::Clear => "clear",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single weather observation as it travels through the pipeline.
///
/// This is both the domain object and the wire shape: JSON, camelCase field
/// tags, timestamps as naive local date-times with second precision.
/// `message` is optional on the wire and populated before distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherEvent {
    pub city: String,
    pub condition: String,
    pub temperature_celsius: f64,
    #[serde(default)]
    pub message: String,
    #[serde(with = "crate::codec::timestamp_format")]
    pub timestamp: NaiveDateTime,
}

impl WeatherEvent {
    /// The human-readable summary derived from the observation.
    pub fn alert_message(&self) -> String {
        format!(
            "New weather alert for {}: {}, {:.1}°C",
            self.city, self.condition, self.temperature_celsius
        )
    }

    /// Populate `message` from the observation when the wire left it empty.
    pub fn with_message(mut self) -> Self {
        if self.message.is_empty() {
            self.message = self.alert_message();
        }
        self
    }
}

/// Durable counterpart of a successfully distributed `WeatherEvent`.
///
/// `id` is assigned by the store on insert and never changes; records are
/// never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherNotification {
    pub id: i64,
    pub city: String,
    pub condition: String,
    pub temperature_celsius: f64,
    pub message: String,
    #[serde(with = "crate::codec::timestamp_format")]
    pub timestamp: NaiveDateTime,
}

/// Insert input for the notification store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub city: String,
    pub condition: String,
    pub temperature_celsius: f64,
    pub message: String,
    pub timestamp: NaiveDateTime,
}

impl From<&WeatherEvent> for NewNotification {
    fn from(event: &WeatherEvent) -> Self {
        NewNotification {
            city: event.city.clone(),
            condition: event.condition.clone(),
            temperature_celsius: event.temperature_celsius,
            message: event.message.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// A registered user with a city and condition preference.
///
/// Seeded at startup and queryable by city/preference; the distribution path
/// currently broadcasts to every connected subscriber regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub city: String,
    pub notification_preference: String,
}

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub city: String,
    pub notification_preference: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(message: &str) -> WeatherEvent {
        WeatherEvent {
            city: "Athlone, IE".to_string(),
            condition: "rain".to_string(),
            temperature_celsius: 12.0,
            message: message.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn classifies_rain_above_threshold() {
        assert_eq!(
            WeatherCondition::from_precipitation(0.6),
            WeatherCondition::Rain
        );
    }

    #[test]
    fn classifies_clear_below_threshold() {
        assert_eq!(
            WeatherCondition::from_precipitation(0.2),
            WeatherCondition::Clear
        );
    }

    #[test]
    fn threshold_itself_is_clear() {
        assert_eq!(
            WeatherCondition::from_precipitation(RAIN_PRECIPITATION_THRESHOLD_MM),
            WeatherCondition::Clear
        );
    }

    #[test]
    fn with_message_populates_empty_message() {
        let event = event("").with_message();
        assert_eq!(event.message, "New weather alert for Athlone, IE: rain, 12.0°C");
    }

    #[test]
    fn with_message_keeps_existing_message() {
        let event = event("already set").with_message();
        assert_eq!(event.message, "already set");
    }
}
