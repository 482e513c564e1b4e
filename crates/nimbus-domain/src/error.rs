use thiserror::Error;

/// A payload that could not be turned into a valid `WeatherEvent`.
///
/// Decode failures are permanent: the same bytes will never decode
/// differently, so the consumer discards the message without retrying.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Store-side failure while persisting or reading notifications.
#[derive(Debug, Error)]
#[error("persistence failure: {0}")]
pub struct PersistenceError(#[from] pub anyhow::Error);

/// Failure while publishing to the live subscriber channel.
#[derive(Debug, Error)]
#[error("broadcast failure: {0}")]
pub struct BroadcastError(#[from] pub anyhow::Error);

/// Failure while publishing an event to the transport.
#[derive(Debug, Error)]
#[error("event publish failed: {0}")]
pub struct PublishError(#[from] pub anyhow::Error);

/// Downstream failure while distributing a decoded event.
///
/// These may recover within the retry window (store or channel briefly
/// unavailable), so the consumer retries and eventually dead-letters.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

/// Everything that can go wrong while handling one delivered message.
///
/// This is the classification point for the retry policy: decode failures
/// are discarded, processing failures are retried then dead-lettered.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("decode failure: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl HandleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandleError::Processing(_))
    }
}
