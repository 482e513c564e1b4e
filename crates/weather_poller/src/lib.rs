pub mod domain;
pub mod open_meteo;
pub mod weather_poller;
