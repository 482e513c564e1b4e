use crate::domain::{ForecastSource, PollError};
use chrono::{NaiveDateTime, Timelike};
use nimbus_domain::{WeatherCondition, WeatherEvent, WeatherEventPublisher};
use std::sync::Arc;
use tracing::{debug, info};

/// What a poll tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// An event was classified and published to the transport.
    Published(WeatherEvent),
    /// The series had no sample for the current hour; nothing was emitted.
    NoMatchingSample,
}

/// Domain service behind the producer scheduler.
///
/// Flow per tick:
/// 1. Fetch the hourly series for the configured location
/// 2. Locate the sample matching the current wall-clock hour
/// 3. Classify precipitation into a condition
/// 4. Build and publish the weather event
pub struct WeatherPollService {
    source: Arc<dyn ForecastSource>,
    producer: Arc<dyn WeatherEventPublisher>,
    city: String,
}

impl WeatherPollService {
    pub fn new(
        source: Arc<dyn ForecastSource>,
        producer: Arc<dyn WeatherEventPublisher>,
        city: String,
    ) -> Self {
        Self {
            source,
            producer,
            city,
        }
    }

    pub async fn poll_once(&self, now: NaiveDateTime) -> Result<PollOutcome, PollError> {
        debug!(city = %self.city, "fetching weather data");

        let forecast = self.source.fetch_hourly().await?;

        let Some(sample) = forecast.sample_for_hour(now) else {
            info!(
                city = %self.city,
                samples = forecast.samples.len(),
                "no sample for the current hour, skipping tick"
            );
            return Ok(PollOutcome::NoMatchingSample);
        };

        let condition = WeatherCondition::from_precipitation(sample.precipitation_mm);

        let event = WeatherEvent {
            city: self.city.clone(),
            condition: condition.to_string(),
            temperature_celsius: sample.temperature_celsius,
            message: String::new(),
            timestamp: now.with_nanosecond(0).unwrap_or(now),
        };

        self.producer.publish(&event).await?;

        info!(
            city = %event.city,
            condition = %event.condition,
            temperature_celsius = event.temperature_celsius,
            precipitation_mm = sample.precipitation_mm,
            "published weather event"
        );

        Ok(PollOutcome::Published(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FetchError, HourlyForecast, HourlySample, MockForecastSource};
    use chrono::NaiveDate;
    use nimbus_domain::{MockWeatherEventPublisher, PublishError};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(15, 23, 42)
            .unwrap()
    }

    fn forecast_with(precipitation_mm: f64, temperature: f64) -> HourlyForecast {
        HourlyForecast {
            samples: vec![HourlySample {
                time: NaiveDate::from_ymd_opt(2025, 3, 14)
                    .unwrap()
                    .and_hms_opt(15, 0, 0)
                    .unwrap(),
                temperature_celsius: temperature,
                precipitation_mm,
            }],
        }
    }

    fn service(
        source: MockForecastSource,
        producer: MockWeatherEventPublisher,
    ) -> WeatherPollService {
        WeatherPollService::new(
            Arc::new(source),
            Arc::new(producer),
            "Athlone, IE".to_string(),
        )
    }

    #[tokio::test]
    async fn heavy_precipitation_publishes_rain() {
        let mut source = MockForecastSource::new();
        let mut producer = MockWeatherEventPublisher::new();

        source
            .expect_fetch_hourly()
            .times(1)
            .returning(|| Ok(forecast_with(0.6, 12.0)));
        producer
            .expect_publish()
            .withf(|event: &WeatherEvent| {
                event.condition == "rain"
                    && event.temperature_celsius == 12.0
                    && event.city == "Athlone, IE"
            })
            .times(1)
            .returning(|_| Ok(()));

        let outcome = service(source, producer).poll_once(now()).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Published(_)));
    }

    #[tokio::test]
    async fn light_precipitation_publishes_clear() {
        let mut source = MockForecastSource::new();
        let mut producer = MockWeatherEventPublisher::new();

        source
            .expect_fetch_hourly()
            .times(1)
            .returning(|| Ok(forecast_with(0.2, 12.0)));
        producer
            .expect_publish()
            .withf(|event: &WeatherEvent| event.condition == "clear")
            .times(1)
            .returning(|_| Ok(()));

        let outcome = service(source, producer).poll_once(now()).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Published(_)));
    }

    #[tokio::test]
    async fn event_timestamp_is_second_precision() {
        let mut source = MockForecastSource::new();
        let mut producer = MockWeatherEventPublisher::new();

        source
            .expect_fetch_hourly()
            .times(1)
            .returning(|| Ok(forecast_with(0.0, 8.0)));
        producer.expect_publish().times(1).returning(|_| Ok(()));

        let with_nanos = now().with_nanosecond(123_456_789).unwrap();
        let outcome = service(source, producer)
            .poll_once(with_nanos)
            .await
            .unwrap();

        let PollOutcome::Published(event) = outcome else {
            panic!("expected a published event");
        };
        assert_eq!(event.timestamp.nanosecond(), 0);
    }

    #[tokio::test]
    async fn missing_hour_skips_without_error() {
        let mut source = MockForecastSource::new();
        let mut producer = MockWeatherEventPublisher::new();

        // Series only covers the next day
        source.expect_fetch_hourly().times(1).returning(|| {
            Ok(HourlyForecast {
                samples: vec![HourlySample {
                    time: NaiveDate::from_ymd_opt(2025, 3, 15)
                        .unwrap()
                        .and_hms_opt(15, 0, 0)
                        .unwrap(),
                    temperature_celsius: 10.0,
                    precipitation_mm: 0.0,
                }],
            })
        });
        producer.expect_publish().times(0);

        let outcome = service(source, producer).poll_once(now()).await.unwrap();
        assert_eq!(outcome, PollOutcome::NoMatchingSample);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_poll_error() {
        let mut source = MockForecastSource::new();
        let mut producer = MockWeatherEventPublisher::new();

        source
            .expect_fetch_hourly()
            .times(1)
            .returning(|| Err(FetchError::Request("connection refused".to_string())));
        producer.expect_publish().times(0);

        let result = service(source, producer).poll_once(now()).await;
        assert!(matches!(result, Err(PollError::Fetch(_))));
    }

    #[tokio::test]
    async fn publish_failure_surfaces_as_poll_error() {
        let mut source = MockForecastSource::new();
        let mut producer = MockWeatherEventPublisher::new();

        source
            .expect_fetch_hourly()
            .times(1)
            .returning(|| Ok(forecast_with(0.6, 12.0)));
        producer
            .expect_publish()
            .times(1)
            .returning(|_| Err(PublishError(anyhow::anyhow!("stream unavailable"))));

        let result = service(source, producer).poll_once(now()).await;
        assert!(matches!(result, Err(PollError::Publish(_))));
    }
}
