use crate::http::{serve, ApiState};
use crate::hub::NotificationHub;
use nimbus_domain::NotificationService;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct NotificationApiConfig {
    pub host: String,
    pub port: u16,
}

/// The HTTP/WebSocket API module: read surface, manual test trigger and the
/// live subscriber endpoints.
pub struct NotificationApi {
    config: NotificationApiConfig,
    state: ApiState,
}

impl NotificationApi {
    pub fn new(
        notifications: Arc<NotificationService>,
        hub: NotificationHub,
        config: NotificationApiConfig,
    ) -> Self {
        info!(
            host = %config.host,
            port = config.port,
            "Initializing Notification API module"
        );
        Self {
            config,
            state: ApiState { notifications, hub },
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
        Box::new(move |ctx| {
            Box::pin(async move { serve(&self.config.host, self.config.port, self.state, ctx).await })
        })
    }
}
