use crate::client::PostgresClient;
use async_trait::async_trait;
use nimbus_domain::{
    NewNotification, NotificationRepository, PersistenceError, WeatherNotification,
};
use tracing::{debug, instrument};

/// PostgreSQL implementation of the notification store.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    client: PostgresClient,
}

impl PostgresNotificationRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

fn row_to_notification(row: &tokio_postgres::Row) -> WeatherNotification {
    WeatherNotification {
        id: row.get("id"),
        city: row.get("city"),
        condition: row.get("condition"),
        temperature_celsius: row.get("temperature_celsius"),
        message: row.get("message"),
        timestamp: row.get("occurred_at"),
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    #[instrument(skip(self, input), fields(city = %input.city, condition = %input.condition))]
    async fn insert(
        &self,
        input: NewNotification,
    ) -> Result<WeatherNotification, PersistenceError> {
        let conn = self.client.get_connection().await.map_err(PersistenceError)?;

        let row = conn
            .query_one(
                "INSERT INTO weather_notifications
                     (city, condition, temperature_celsius, message, occurred_at)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id",
                &[
                    &input.city,
                    &input.condition,
                    &input.temperature_celsius,
                    &input.message,
                    &input.timestamp,
                ],
            )
            .await
            .map_err(|e| PersistenceError(e.into()))?;

        let id: i64 = row.get("id");
        debug!(notification_id = id, "notification inserted");

        Ok(WeatherNotification {
            id,
            city: input.city,
            condition: input.condition,
            temperature_celsius: input.temperature_celsius,
            message: input.message,
            timestamp: input.timestamp,
        })
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, limit: i64) -> Result<Vec<WeatherNotification>, PersistenceError> {
        let conn = self.client.get_connection().await.map_err(PersistenceError)?;

        let rows = conn
            .query(
                "SELECT id, city, condition, temperature_celsius, message, occurred_at
                 FROM weather_notifications
                 ORDER BY occurred_at DESC
                 LIMIT $1",
                &[&limit],
            )
            .await
            .map_err(|e| PersistenceError(e.into()))?;

        debug!(count = rows.len(), "fetched recent notifications");

        Ok(rows.iter().map(row_to_notification).collect())
    }
}
