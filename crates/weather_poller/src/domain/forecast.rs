use crate::domain::FetchError;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};

/// One hourly observation from the external series.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySample {
    pub time: NaiveDateTime,
    pub temperature_celsius: f64,
    pub precipitation_mm: f64,
}

/// An hourly forecast series for one location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlyForecast {
    pub samples: Vec<HourlySample>,
}

impl HourlyForecast {
    /// The sample whose date and hour match the given wall-clock time.
    pub fn sample_for_hour(&self, now: NaiveDateTime) -> Option<&HourlySample> {
        self.samples
            .iter()
            .find(|sample| sample.time.date() == now.date() && sample.time.hour() == now.hour())
    }
}

/// External forecast source for a fixed location.
/// Infrastructure (the Open-Meteo client) implements this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_hourly(&self) -> Result<HourlyForecast, FetchError>;
}
