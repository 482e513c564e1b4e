use crate::error::{PersistenceError, ProcessingError};
use crate::repository::{NotificationPublisher, NotificationRepository};
use crate::types::{NewNotification, WeatherEvent, WeatherNotification};
use std::sync::Arc;
use tracing::{debug, info};

/// Distribution sink for processed weather events.
///
/// Every delivery persists a notification first and only then publishes to
/// the live channel, so a subscriber never sees an event the query surface
/// cannot also return. A persistence failure fails the whole call and the
/// broadcast is not attempted.
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Persist the event and broadcast it to all connected subscribers.
    pub async fn send_weather_notification(
        &self,
        event: WeatherEvent,
    ) -> Result<WeatherNotification, ProcessingError> {
        let event = event.with_message();

        debug!(
            city = %event.city,
            condition = %event.condition,
            "delivering weather notification"
        );

        let stored = self.repository.insert(NewNotification::from(&event)).await?;
        self.publisher.broadcast(&event).await?;

        info!(
            notification_id = stored.id,
            city = %event.city,
            condition = %event.condition,
            "weather notification stored and broadcast"
        );

        Ok(stored)
    }

    /// Persist the event and deliver it to one named subscriber.
    pub async fn send_notification_to_subscriber(
        &self,
        subscriber_id: &str,
        event: WeatherEvent,
    ) -> Result<WeatherNotification, ProcessingError> {
        let event = event.with_message();

        let stored = self.repository.insert(NewNotification::from(&event)).await?;
        self.publisher.send_to_subscriber(subscriber_id, &event).await?;

        info!(
            notification_id = stored.id,
            subscriber_id,
            city = %event.city,
            "weather notification stored and sent to subscriber"
        );

        Ok(stored)
    }

    /// The most recent persisted notifications, newest first.
    pub async fn recent_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<WeatherNotification>, PersistenceError> {
        self.repository.list_recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BroadcastError, PersistenceError};
    use crate::repository::{MockNotificationPublisher, MockNotificationRepository};
    use chrono::NaiveDate;
    use mockall::Sequence;

    fn event() -> WeatherEvent {
        WeatherEvent {
            city: "Athlone, IE".to_string(),
            condition: "rain".to_string(),
            temperature_celsius: 12.0,
            message: String::new(),
            timestamp: NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
        }
    }

    fn stored(input: &NewNotification) -> WeatherNotification {
        WeatherNotification {
            id: 1,
            city: input.city.clone(),
            condition: input.condition.clone(),
            temperature_celsius: input.temperature_celsius,
            message: input.message.clone(),
            timestamp: input.timestamp,
        }
    }

    #[tokio::test]
    async fn persists_before_broadcasting() {
        let mut repository = MockNotificationRepository::new();
        let mut publisher = MockNotificationPublisher::new();
        let mut order = Sequence::new();

        repository
            .expect_insert()
            .times(1)
            .in_sequence(&mut order)
            .returning(|input| Ok(stored(&input)));
        publisher
            .expect_broadcast()
            .times(1)
            .in_sequence(&mut order)
            .returning(|_| Ok(()));

        let service = NotificationService::new(Arc::new(repository), Arc::new(publisher));
        let result = service.send_weather_notification(event()).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn populates_message_before_distribution() {
        let mut repository = MockNotificationRepository::new();
        let mut publisher = MockNotificationPublisher::new();

        repository
            .expect_insert()
            .withf(|input: &NewNotification| {
                input.message == "New weather alert for Athlone, IE: rain, 12.0°C"
            })
            .times(1)
            .returning(|input| Ok(stored(&input)));
        publisher
            .expect_broadcast()
            .withf(|event: &WeatherEvent| !event.message.is_empty())
            .times(1)
            .returning(|_| Ok(()));

        let service = NotificationService::new(Arc::new(repository), Arc::new(publisher));
        service.send_weather_notification(event()).await.unwrap();
    }

    #[tokio::test]
    async fn persistence_failure_skips_broadcast() {
        let mut repository = MockNotificationRepository::new();
        let mut publisher = MockNotificationPublisher::new();

        repository
            .expect_insert()
            .times(1)
            .returning(|_| Err(PersistenceError(anyhow::anyhow!("store unavailable"))));
        publisher.expect_broadcast().times(0);

        let service = NotificationService::new(Arc::new(repository), Arc::new(publisher));
        let result = service.send_weather_notification(event()).await;

        assert!(matches!(result, Err(ProcessingError::Persistence(_))));
    }

    #[tokio::test]
    async fn broadcast_failure_surfaces_after_persist() {
        let mut repository = MockNotificationRepository::new();
        let mut publisher = MockNotificationPublisher::new();

        repository
            .expect_insert()
            .times(1)
            .returning(|input| Ok(stored(&input)));
        publisher
            .expect_broadcast()
            .times(1)
            .returning(|_| Err(BroadcastError(anyhow::anyhow!("channel gone"))));

        let service = NotificationService::new(Arc::new(repository), Arc::new(publisher));
        let result = service.send_weather_notification(event()).await;

        assert!(matches!(result, Err(ProcessingError::Broadcast(_))));
    }

    #[tokio::test]
    async fn directed_delivery_targets_named_subscriber() {
        let mut repository = MockNotificationRepository::new();
        let mut publisher = MockNotificationPublisher::new();

        repository
            .expect_insert()
            .times(1)
            .returning(|input| Ok(stored(&input)));
        publisher
            .expect_send_to_subscriber()
            .withf(|subscriber_id: &str, _: &WeatherEvent| subscriber_id == "alice")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = NotificationService::new(Arc::new(repository), Arc::new(publisher));
        service
            .send_notification_to_subscriber("alice", event())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn recent_notifications_delegates_to_store() {
        let mut repository = MockNotificationRepository::new();
        let publisher = MockNotificationPublisher::new();

        repository
            .expect_list_recent()
            .withf(|limit: &i64| *limit == 50)
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let service = NotificationService::new(Arc::new(repository), Arc::new(publisher));
        let notifications = service.recent_notifications(50).await.unwrap();
        assert!(notifications.is_empty());
    }
}
