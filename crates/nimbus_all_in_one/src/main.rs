mod config;
mod telemetry;

use config::ServiceConfig;
use nimbus_domain::{NewUser, NotificationService, UserRepository};
use nimbus_nats::{NatsClient, WeatherEventProducer};
use nimbus_postgres::{PostgresClient, PostgresNotificationRepository, PostgresUserRepository};
use nimbus_runner::Runner;
use notification_api::{NotificationApi, NotificationApiConfig, NotificationHub};
use notification_worker::notification_worker::{NotificationWorker, NotificationWorkerConfig};
use std::sync::Arc;
use std::time::Duration;
use telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use tracing::{debug, error, info, warn};
use weather_poller::domain::WeatherPollService;
use weather_poller::open_meteo::OpenMeteoClient;
use weather_poller::weather_poller::{WeatherPoller, WeatherPollerConfig};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        "Starting nimbus-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    // Initialize shared dependencies
    let (postgres_client, nats_client) = match initialize_shared_dependencies(&config).await {
        Ok(deps) => deps,
        Err(e) => {
            error!("Failed to initialize shared dependencies: {}", e);
            std::process::exit(1);
        }
    };

    let notification_repository = Arc::new(PostgresNotificationRepository::new(
        postgres_client.clone(),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(postgres_client));

    if let Err(e) = seed_users(user_repository.as_ref()).await {
        error!("Failed to seed users: {}", e);
        std::process::exit(1);
    }

    // Live subscriber hub, shared by the sink and the WebSocket endpoints
    let hub = NotificationHub::with_capacity(config.hub_capacity);

    let notification_service = Arc::new(NotificationService::new(
        notification_repository,
        Arc::new(hub.clone()),
    ));

    // Initialize application modules
    let notification_api = NotificationApi::new(
        notification_service.clone(),
        hub.clone(),
        NotificationApiConfig {
            host: config.http_host.clone(),
            port: config.http_port,
        },
    );

    let notification_worker = match NotificationWorker::new(
        notification_service.clone(),
        nats_client.clone(),
        NotificationWorkerConfig {
            weather_stream: config.weather_stream.clone(),
            weather_subject: config.weather_subject.clone(),
            dead_letter_stream: config.dead_letter_stream.clone(),
            consumer_name: config.consumer_name.clone(),
            workers: config.consumer_workers,
            batch_size: config.nats_batch_size,
            batch_wait_secs: config.nats_batch_wait_secs,
            max_delivery_attempts: config.max_delivery_attempts,
            retry_delay_secs: config.retry_delay_secs,
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize notification worker: {}", e);
            std::process::exit(1);
        }
    };

    let weather_poller = match build_weather_poller(&config, &nats_client) {
        Ok(poller) => poller,
        Err(e) => {
            error!("Failed to initialize weather poller: {}", e);
            std::process::exit(1);
        }
    };

    // Build runner with all processes
    let mut runner = Runner::new();

    runner = runner.with_named_process("notification_api", notification_api.into_runner_process());
    runner = runner.with_named_process("weather_poller", weather_poller.into_runner_process());

    let worker_processes = notification_worker.into_runner_processes();
    for (i, process) in worker_processes.into_iter().enumerate() {
        runner = runner.with_named_process(format!("notification_worker_{}", i), process);
    }

    // Add cleanup handlers
    runner = runner
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || {
                Box::pin(async move {
                    info!("Running cleanup tasks...");
                    if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                        client.close().await;
                    }

                    // Shutdown telemetry and flush pending traces and logs
                    shutdown_telemetry(telemetry_providers);

                    info!("Cleanup complete");
                    Ok(())
                })
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    // Run the service
    runner.run().await;
}

async fn initialize_shared_dependencies(
    config: &ServiceConfig,
) -> anyhow::Result<(PostgresClient, Arc<NatsClient>)> {
    // PostgreSQL initialization
    info!("Initializing PostgreSQL...");
    let postgres_client = PostgresClient::new(
        &config.postgres_host,
        config.postgres_port,
        &config.postgres_database,
        &config.postgres_username,
        &config.postgres_password,
        config.postgres_max_connections,
    )?;
    postgres_client.ping().await?;
    postgres_client.init_schema().await?;

    // NATS initialization
    info!("Initializing NATS...");
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );
    nats_client
        .ensure_stream(&config.weather_stream, "Weather event stream")
        .await?;
    nats_client
        .ensure_stream(
            &config.dead_letter_stream,
            "Dead-lettered weather events for operator inspection",
        )
        .await?;

    Ok((postgres_client, nats_client))
}

fn build_weather_poller(
    config: &ServiceConfig,
    nats_client: &Arc<NatsClient>,
) -> anyhow::Result<WeatherPoller> {
    let source = Arc::new(OpenMeteoClient::new(config.open_meteo_url.clone())?);
    let producer = Arc::new(WeatherEventProducer::new(
        nats_client.jetstream().clone(),
        config.weather_stream.clone(),
    ));
    let service = Arc::new(WeatherPollService::new(
        source,
        producer,
        config.poll_city.clone(),
    ));

    Ok(WeatherPoller::new(
        service,
        WeatherPollerConfig {
            poll_interval_secs: config.poll_interval_secs,
        },
    ))
}

/// Seed sample users so the preference lookup has data to answer from.
/// The distribution path itself broadcasts to every connected subscriber.
async fn seed_users(repository: &PostgresUserRepository) -> anyhow::Result<()> {
    let users = [
        NewUser {
            user_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            city: "Athlone, IE".to_string(),
            notification_preference: "rain".to_string(),
        },
        NewUser {
            user_name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            city: "Athlone, IE".to_string(),
            notification_preference: "clear".to_string(),
        },
        NewUser {
            user_name: "Charlie".to_string(),
            email: "charlie@example.com".to_string(),
            city: "New York, US".to_string(),
            notification_preference: "rain".to_string(),
        },
    ];

    for user in users {
        let email = user.email.clone();
        match repository.create_user(user).await? {
            Some(user) => info!(user_id = user.id, email = %email, "seeded user"),
            None => warn!(email = %email, "user already seeded"),
        }
    }

    info!("Initialized sample users in the database");
    Ok(())
}
