mod weather_event_handler;

pub use weather_event_handler::*;
