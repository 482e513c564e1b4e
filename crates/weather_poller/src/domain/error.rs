use nimbus_domain::PublishError;
use thiserror::Error;

/// Failure while fetching or interpreting the external forecast.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("weather api request failed: {0}")]
    Request(String),

    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),
}

/// Everything that can end a poll tick early.
///
/// Poll errors never escape the scheduler loop; they are logged and the next
/// tick runs as usual.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
