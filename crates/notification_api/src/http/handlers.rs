use crate::hub::NotificationHub;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDateTime, Timelike};
use futures::{SinkExt, StreamExt};
use nimbus_domain::{
    codec, NotificationService, PersistenceError, ProcessingError, WeatherEvent,
    WeatherNotification,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Number of records returned by the read API.
const RECENT_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct ApiState {
    pub notifications: Arc<NotificationService>,
    pub hub: NotificationHub,
}

pub enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(error) => {
                warn!(error = %error, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        let body = Json(serde_json::json!({
            "status": "error",
            "message": message,
        }));
        (status, body).into_response()
    }
}

impl From<ProcessingError> for ApiError {
    fn from(error: ProcessingError) -> Self {
        ApiError::Internal(anyhow::Error::new(error))
    }
}

impl From<PersistenceError> for ApiError {
    fn from(error: PersistenceError) -> Self {
        ApiError::Internal(anyhow::Error::new(error))
    }
}

/// GET /api/notifications — the 50 most recent records, newest first.
pub async fn recent_notifications(
    State(state): State<ApiState>,
) -> Result<Json<Vec<WeatherNotification>>, ApiError> {
    let notifications = state.notifications.recent_notifications(RECENT_LIMIT).await?;
    Ok(Json(notifications))
}

/// Manual test trigger body: a weather event with an optional timestamp.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWeatherRequest {
    pub city: String,
    pub condition: String,
    pub temperature_celsius: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default, with = "codec::timestamp_format::option")]
    pub timestamp: Option<NaiveDateTime>,
}

impl TestWeatherRequest {
    fn into_event(self, now: NaiveDateTime) -> WeatherEvent {
        WeatherEvent {
            city: self.city,
            condition: self.condition,
            temperature_celsius: self.temperature_celsius,
            message: self.message,
            timestamp: self.timestamp.unwrap_or(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TestWeatherResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// POST /api/weather/test — route a hand-built event through the
/// distribution sink exactly as a consumed message would be, bypassing the
/// transport.
pub async fn test_notification(
    State(state): State<ApiState>,
    Json(request): Json<TestWeatherRequest>,
) -> Result<Json<TestWeatherResponse>, ApiError> {
    let now = chrono::Local::now()
        .naive_local()
        .with_nanosecond(0)
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    let event = request.into_event(now);

    if event.city.trim().is_empty() || event.condition.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "city and condition must not be empty".to_string(),
        ));
    }
    if !event.temperature_celsius.is_finite() {
        return Err(ApiError::BadRequest(
            "temperatureCelsius must be finite".to_string(),
        ));
    }

    state.notifications.send_weather_notification(event).await?;

    Ok(Json(TestWeatherResponse {
        status: "success",
        message: "Test notification sent successfully",
    }))
}

/// GET /api/weather/sample — an example event body for manual testing.
pub async fn sample_weather_event() -> Json<WeatherEvent> {
    let now = chrono::Local::now()
        .naive_local()
        .with_nanosecond(0)
        .unwrap_or_else(|| chrono::Local::now().naive_local());
    Json(WeatherEvent {
        city: "Sample City".to_string(),
        condition: "clear".to_string(),
        temperature_celsius: 25.5,
        message: "Clear skies with mild temperature".to_string(),
        timestamp: now,
    })
}

/// GET /ws/notifications — every delivered event, for all connected clients.
pub async fn notifications_websocket(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| stream_notifications(socket, rx))
}

/// GET /ws/notifications/:subscriber_id — directed deliveries only.
pub async fn subscriber_websocket(
    ws: WebSocketUpgrade,
    Path(subscriber_id): Path<String>,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    let rx = state.hub.subscribe_directed(&subscriber_id).await;
    ws.on_upgrade(move |socket| stream_notifications(socket, rx))
}

/// Forward hub events to one WebSocket client until it disconnects.
async fn stream_notifications(socket: WebSocket, mut rx: broadcast::Receiver<WeatherEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        let Ok(body) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if sender.send(Message::Text(body)).await.is_err() {
                            break; // Client disconnected
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Best-effort channel: a slow client just misses events
                        warn!(skipped, "websocket client lagged behind broadcast");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Handle client frames (ping/pong, close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    debug!("websocket client disconnected");
}
