use crate::domain::{FetchError, ForecastSource, HourlyForecast, HourlySample};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

/// Format of the `hourly.time` entries in the Open-Meteo response.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Open-Meteo forecast API client.
///
/// One GET against a pre-built forecast URL (location and hourly variables
/// are encoded in the query string). Unknown response fields are ignored.
pub struct OpenMeteoClient {
    url: String,
    client: reqwest::Client,
}

/// Open-Meteo API response
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    time: Vec<String>,
    #[serde(rename = "temperature_2m")]
    temperature_2m: Vec<f64>,
    precipitation: Vec<f64>,
}

impl OpenMeteoClient {
    pub fn new(url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { url, client })
    }
}

#[async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn fetch_hourly(&self) -> Result<HourlyForecast, FetchError> {
        debug!(url = %self.url, "fetching forecast from Open-Meteo");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Request(format!(
                "weather api returned {status}: {body}"
            )));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| FetchError::UnexpectedBody(e.to_string()))?;

        forecast_to_domain(forecast)
    }
}

/// Convert the index-aligned arrays into per-sample domain values.
fn forecast_to_domain(response: ForecastResponse) -> Result<HourlyForecast, FetchError> {
    let hourly = response.hourly;

    if hourly.time.len() != hourly.temperature_2m.len()
        || hourly.time.len() != hourly.precipitation.len()
    {
        return Err(FetchError::UnexpectedBody(format!(
            "misaligned hourly arrays: {} times, {} temperatures, {} precipitation values",
            hourly.time.len(),
            hourly.temperature_2m.len(),
            hourly.precipitation.len()
        )));
    }

    let mut samples = Vec::with_capacity(hourly.time.len());
    for (index, raw_time) in hourly.time.iter().enumerate() {
        let time = NaiveDateTime::parse_from_str(raw_time, TIME_FORMAT).map_err(|e| {
            FetchError::UnexpectedBody(format!("unparseable hourly time '{raw_time}': {e}"))
        })?;
        samples.push(HourlySample {
            time,
            temperature_celsius: hourly.temperature_2m[index],
            precipitation_mm: hourly.precipitation[index],
        });
    }

    Ok(HourlyForecast { samples })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(body: &str) -> Result<HourlyForecast, FetchError> {
        let response: ForecastResponse = serde_json::from_str(body).expect("valid test body");
        forecast_to_domain(response)
    }

    #[test]
    fn parses_aligned_hourly_series() {
        let forecast = parse(
            r#"{
                "latitude": 53.42,
                "longitude": -7.94,
                "generationtime_ms": 0.2,
                "hourly": {
                    "time": ["2025-03-14T14:00", "2025-03-14T15:00"],
                    "temperature_2m": [11.2, 12.0],
                    "precipitation": [0.0, 0.6]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(forecast.samples.len(), 2);
        assert_eq!(
            forecast.samples[1].time,
            NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap()
        );
        assert_eq!(forecast.samples[1].temperature_celsius, 12.0);
        assert_eq!(forecast.samples[1].precipitation_mm, 0.6);
    }

    #[test]
    fn rejects_misaligned_arrays() {
        let err = parse(
            r#"{
                "hourly": {
                    "time": ["2025-03-14T14:00", "2025-03-14T15:00"],
                    "temperature_2m": [11.2],
                    "precipitation": [0.0, 0.6]
                }
            }"#,
        )
        .unwrap_err();

        assert!(matches!(err, FetchError::UnexpectedBody(_)));
    }

    #[test]
    fn rejects_unparseable_times() {
        let err = parse(
            r#"{
                "hourly": {
                    "time": ["yesterday"],
                    "temperature_2m": [11.2],
                    "precipitation": [0.0]
                }
            }"#,
        )
        .unwrap_err();

        assert!(matches!(err, FetchError::UnexpectedBody(_)));
    }
}
