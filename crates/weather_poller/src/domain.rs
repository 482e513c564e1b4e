mod error;
mod forecast;
mod weather_poll_service;

pub use error::*;
pub use forecast::*;
pub use weather_poll_service::*;
