pub mod http;
pub mod hub;
pub mod notification_api;

pub use hub::NotificationHub;
pub use notification_api::{NotificationApi, NotificationApiConfig};
