pub mod codec;

mod error;
mod notification_service;
mod repository;
mod types;

pub use error::*;
pub use notification_service::*;
pub use repository::*;
pub use types::*;

// Re-export mocks when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use repository::MockNotificationPublisher;
#[cfg(any(test, feature = "testing"))]
pub use repository::MockNotificationRepository;
#[cfg(any(test, feature = "testing"))]
pub use repository::MockUserRepository;
#[cfg(any(test, feature = "testing"))]
pub use repository::MockWeatherEventPublisher;
