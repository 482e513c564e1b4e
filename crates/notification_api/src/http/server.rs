use crate::http::handlers::{
    notifications_websocket, recent_notifications, sample_weather_event, subscriber_websocket,
    test_notification, ApiState,
};
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/notifications", get(recent_notifications))
        .route("/api/weather/test", post(test_notification))
        .route("/api/weather/sample", get(sample_weather_event))
        .route("/ws/notifications", get(notifications_websocket))
        .route(
            "/ws/notifications/:subscriber_id",
            get(subscriber_websocket),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the HTTP/WebSocket API until cancellation.
pub async fn serve(host: &str, port: u16, state: ApiState, ctx: CancellationToken) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;

    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(ctx.cancelled_owned())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped gracefully");
    Ok(())
}
