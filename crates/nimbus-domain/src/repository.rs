use crate::error::{BroadcastError, PersistenceError, PublishError};
use crate::types::{NewNotification, NewUser, User, WeatherEvent, WeatherNotification};
use async_trait::async_trait;

/// Store for persisted weather notifications.
/// Infrastructure (nimbus-postgres) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification; the store assigns the identity.
    async fn insert(&self, input: NewNotification) -> Result<WeatherNotification, PersistenceError>;

    /// The most recent notifications, ordered by timestamp descending.
    async fn list_recent(&self, limit: i64) -> Result<Vec<WeatherNotification>, PersistenceError>;
}

/// Store for registered users and their notification preferences.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user. Returns `None` when the email is already registered.
    async fn create_user(&self, input: NewUser) -> Result<Option<User>, PersistenceError>;

    /// Users registered for a city with a matching condition preference.
    async fn find_by_city_and_preference(
        &self,
        city: &str,
        preference: &str,
    ) -> Result<Vec<User>, PersistenceError>;
}

/// Live subscriber channel: one broadcast destination reaching every
/// connected subscriber plus an addressable per-subscriber destination.
/// Publishing is best-effort; delivery to disconnected subscribers is not
/// guaranteed and a publish must not block the caller.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn broadcast(&self, event: &WeatherEvent) -> Result<(), BroadcastError>;

    async fn send_to_subscriber(
        &self,
        subscriber_id: &str,
        event: &WeatherEvent,
    ) -> Result<(), BroadcastError>;
}

/// Transport producer for weather events.
/// Infrastructure (nimbus-nats) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WeatherEventPublisher: Send + Sync {
    async fn publish(&self, event: &WeatherEvent) -> Result<(), PublishError>;
}
