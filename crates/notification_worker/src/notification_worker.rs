use crate::nats::WeatherEventHandler;
use nimbus_domain::NotificationService;
use nimbus_nats::{DeadLetterProducer, NatsClient, RetryPolicy, WeatherEventConsumer};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct NotificationWorkerConfig {
    pub weather_stream: String,
    pub weather_subject: String,
    pub dead_letter_stream: String,
    pub consumer_name: String,
    /// Number of parallel consumer workers sharing the durable consumer.
    pub workers: usize,
    pub batch_size: usize,
    pub batch_wait_secs: u64,
    /// Total delivery attempts before dead-lettering.
    pub max_delivery_attempts: i64,
    pub retry_delay_secs: u64,
}

/// The consumer pipeline module.
///
/// Wires the event handler into a fixed pool of consumer workers that share
/// one durable consumer on the weather stream.
pub struct NotificationWorker {
    consumers: Vec<WeatherEventConsumer>,
}

impl NotificationWorker {
    pub async fn new(
        notification_service: Arc<NotificationService>,
        nats_client: Arc<NatsClient>,
        config: NotificationWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!(
            workers = config.workers,
            stream = %config.weather_stream,
            "Initializing Notification Worker module"
        );

        let handler = Arc::new(WeatherEventHandler::new(notification_service));
        let dead_letters = Arc::new(DeadLetterProducer::new(
            nats_client.jetstream().clone(),
            config.dead_letter_stream.clone(),
        ));
        let policy = RetryPolicy {
            max_attempts: config.max_delivery_attempts,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        };

        let mut consumers = Vec::with_capacity(config.workers);
        for _ in 0..config.workers.max(1) {
            let consumer = WeatherEventConsumer::new(
                nats_client.jetstream(),
                &config.weather_stream,
                &config.consumer_name,
                &config.weather_subject,
                config.batch_size,
                config.batch_wait_secs,
                policy,
                handler.clone(),
                dead_letters.clone(),
            )
            .await?;
            consumers.push(consumer);
        }

        info!("Notification Worker initialized");

        Ok(Self { consumers })
    }

    pub fn into_runner_processes(
        self,
    ) -> Vec<
        Box<
            dyn FnOnce(
                    CancellationToken,
                )
                    -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
                + Send,
        >,
    > {
        self.consumers
            .into_iter()
            .map(|consumer| {
                let process: Box<
                    dyn FnOnce(
                            CancellationToken,
                        ) -> Pin<
                            Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>,
                        > + Send,
                > = Box::new(move |ctx| Box::pin(async move { consumer.run(ctx).await }));
                process
            })
            .collect()
    }
}
