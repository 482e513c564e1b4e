use async_trait::async_trait;
use nimbus_domain::{codec, HandleError, NotificationService};
use nimbus_nats::WeatherMessageHandler;
use std::sync::Arc;
use tracing::debug;

/// Decodes delivered payloads and forwards them to the distribution sink.
///
/// Returns `HandleError::Decode` for payloads that can never become valid
/// and `HandleError::Processing` for downstream failures; the consumer loop
/// turns those into discard vs retry/dead-letter.
pub struct WeatherEventHandler {
    notification_service: Arc<NotificationService>,
}

impl WeatherEventHandler {
    pub fn new(notification_service: Arc<NotificationService>) -> Self {
        Self {
            notification_service,
        }
    }
}

#[async_trait]
impl WeatherMessageHandler for WeatherEventHandler {
    async fn handle(&self, subject: &str, payload: &[u8]) -> Result<(), HandleError> {
        let event = codec::decode(payload)?;

        debug!(
            subject = %subject,
            city = %event.city,
            condition = %event.condition,
            "received weather event"
        );

        self.notification_service
            .send_weather_notification(event)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nimbus_domain::{
        MockNotificationPublisher, MockNotificationRepository, NewNotification, PersistenceError,
        WeatherEvent, WeatherNotification,
    };

    fn payload() -> Vec<u8> {
        codec::encode(&WeatherEvent {
            city: "Athlone, IE".to_string(),
            condition: "rain".to_string(),
            temperature_celsius: 12.0,
            message: String::new(),
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
        })
        .unwrap()
    }

    fn handler(
        repository: MockNotificationRepository,
        publisher: MockNotificationPublisher,
    ) -> WeatherEventHandler {
        WeatherEventHandler::new(Arc::new(NotificationService::new(
            Arc::new(repository),
            Arc::new(publisher),
        )))
    }

    #[tokio::test]
    async fn delivers_each_message_to_the_sink_exactly_once() {
        let mut repository = MockNotificationRepository::new();
        let mut publisher = MockNotificationPublisher::new();

        repository
            .expect_insert()
            .times(1)
            .returning(|input: NewNotification| {
                Ok(WeatherNotification {
                    id: 1,
                    city: input.city,
                    condition: input.condition,
                    temperature_celsius: input.temperature_celsius,
                    message: input.message,
                    timestamp: input.timestamp,
                })
            });
        publisher.expect_broadcast().times(1).returning(|_| Ok(()));

        let result = handler(repository, publisher)
            .handle("weather_events.athlone-ie", &payload())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_failure() {
        let repository = MockNotificationRepository::new();
        let publisher = MockNotificationPublisher::new();

        let result = handler(repository, publisher)
            .handle("weather_events.athlone-ie", b"{ not json")
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, HandleError::Decode(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn sink_failure_is_retryable() {
        let mut repository = MockNotificationRepository::new();
        let publisher = MockNotificationPublisher::new();

        repository
            .expect_insert()
            .times(1)
            .returning(|_| Err(PersistenceError(anyhow::anyhow!("store unavailable"))));

        let result = handler(repository, publisher)
            .handle("weather_events.athlone-ie", &payload())
            .await;

        let err = result.unwrap_err();
        assert!(err.is_retryable());
    }
}
