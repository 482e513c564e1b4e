mod client;
mod notification_repository;
mod user_repository;

pub use client::*;
pub use notification_repository::*;
pub use user_repository::*;
