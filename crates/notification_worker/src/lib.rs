pub mod nats;
pub mod notification_worker;
