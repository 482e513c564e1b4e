use crate::domain::{PollOutcome, WeatherPollService};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct WeatherPollerConfig {
    /// Seconds between poll ticks.
    pub poll_interval_secs: u64,
}

/// The producer scheduler module.
///
/// Runs one serialized tick loop; every tick is a failure-isolation unit, so
/// a failed fetch or publish is logged and the next tick runs normally.
pub struct WeatherPoller {
    service: Arc<WeatherPollService>,
    interval: Duration,
}

impl WeatherPoller {
    pub fn new(service: Arc<WeatherPollService>, config: WeatherPollerConfig) -> Self {
        info!(
            poll_interval_secs = config.poll_interval_secs,
            "Initializing Weather Poller module"
        );
        Self {
            service,
            interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    pub async fn run(&self, ctx: CancellationToken) -> anyhow::Result<()> {
        info!("Starting weather poll loop");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping weather poller");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Weather poller stopped gracefully");
        Ok(())
    }

    async fn tick(&self) {
        let now = chrono::Local::now().naive_local();
        match self.service.poll_once(now).await {
            Ok(PollOutcome::Published(event)) => {
                info!(
                    city = %event.city,
                    condition = %event.condition,
                    "poll tick published weather event"
                );
            }
            Ok(PollOutcome::NoMatchingSample) => {
                info!("poll tick found no sample for the current hour");
            }
            Err(e) => {
                // Ticks are independent; never let one failure stop the loop
                error!(error = %e, "poll tick failed");
            }
        }
    }

    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            )
                -> Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>
            + Send,
    > {
        Box::new(move |ctx| Box::pin(async move { self.run(ctx).await }))
    }
}
