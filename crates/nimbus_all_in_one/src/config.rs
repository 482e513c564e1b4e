use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// JetStream stream name for weather events
    #[serde(default = "default_weather_stream")]
    pub weather_stream: String,

    /// Subject pattern for the weather event consumer filter
    #[serde(default = "default_weather_subject")]
    pub weather_subject: String,

    /// JetStream stream name for dead-lettered weather events
    #[serde(default = "default_dead_letter_stream")]
    pub dead_letter_stream: String,

    /// Durable consumer name shared by the worker pool
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,

    /// Number of parallel consumer workers
    #[serde(default = "default_consumer_workers")]
    pub consumer_workers: usize,

    /// Batch size for consumer fetches
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for consumer fetches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Total delivery attempts before a message is dead-lettered
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: i64,

    /// Fixed delay between redeliveries in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Maximum connections in the pool
    #[serde(default = "default_postgres_max_connections")]
    pub postgres_max_connections: usize,

    // Weather poller configuration
    /// Open-Meteo forecast URL (location and hourly variables in the query)
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,

    /// City label attached to published weather events
    #[serde(default = "default_poll_city")]
    pub poll_city: String,

    /// Seconds between poll ticks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    // HTTP configuration
    /// HTTP server host
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Broadcast channel capacity per hub channel
    #[serde(default = "default_hub_capacity")]
    pub hub_capacity: usize,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for the OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_weather_stream() -> String {
    "weather_events".to_string()
}

fn default_weather_subject() -> String {
    "weather_events.>".to_string()
}

fn default_dead_letter_stream() -> String {
    "weather_events_dlt".to_string()
}

fn default_consumer_name() -> String {
    "notification-worker".to_string()
}

fn default_consumer_workers() -> usize {
    2
}

fn default_nats_batch_size() -> usize {
    10
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_max_delivery_attempts() -> i64 {
    3
}

fn default_retry_delay_secs() -> u64 {
    1
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "nimbus".to_string()
}

fn default_postgres_username() -> String {
    "nimbus".to_string()
}

fn default_postgres_password() -> String {
    "nimbus".to_string()
}

fn default_postgres_max_connections() -> usize {
    5
}

// Weather poller defaults
fn default_open_meteo_url() -> String {
    "https://api.open-meteo.com/v1/forecast?latitude=53.42&longitude=-7.94&hourly=temperature_2m,precipitation"
        .to_string()
}

fn default_poll_city() -> String {
    "Athlone, IE".to_string()
}

fn default_poll_interval_secs() -> u64 {
    600
}

// HTTP defaults
fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_hub_capacity() -> usize {
    256
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "nimbus-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("NIMBUS"))
            .build()?
            .try_deserialize()
    }
}
