use crate::dead_letter::DeadLetterProducer;
use anyhow::{Context, Result};
use async_nats::jetstream::{self, consumer::PullConsumer, AckKind, Message};
use async_trait::async_trait;
use futures::StreamExt;
use nimbus_domain::HandleError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Processes one delivered message.
///
/// The handler owns decoding and downstream delivery; the consumer loop owns
/// acknowledgment, retry and dead-lettering based on the returned error kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherMessageHandler: Send + Sync {
    async fn handle(&self, subject: &str, payload: &[u8]) -> Result<(), HandleError>;
}

/// Bounded fixed-delay retry policy for retryable failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total delivery attempts before dead-lettering (initial + retries).
    pub max_attempts: i64,
    /// Fixed delay between redeliveries.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// What to do with a delivered message after the handler returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Acknowledge and move on (permanent discard for non-retryable errors).
    Discard,
    /// Leave unacknowledged; the transport redelivers after the delay.
    Retry(Duration),
    /// Forward to the dead-letter stream, then acknowledge the original.
    DeadLetter,
}

/// The explicit classification point for the retry policy.
///
/// Malformed data can never become valid by retrying, so decode failures are
/// discarded immediately. Everything else gets `max_attempts` deliveries and
/// is then dead-lettered.
pub fn disposition_for(error: &HandleError, delivered: i64, policy: &RetryPolicy) -> Disposition {
    if !error.is_retryable() {
        return Disposition::Discard;
    }
    if delivered >= policy.max_attempts {
        Disposition::DeadLetter
    } else {
        Disposition::Retry(policy.retry_delay)
    }
}

/// Durable pull-consumer worker for the weather event stream.
///
/// Several workers may share the same durable consumer; the server hands each
/// message to exactly one of them. Acknowledgment is manual and per record:
/// nothing is committed before the handler returns.
pub struct WeatherEventConsumer {
    consumer: PullConsumer,
    stream_name: String,
    consumer_name: String,
    batch_size: usize,
    max_wait: Duration,
    policy: RetryPolicy,
    handler: Arc<dyn WeatherMessageHandler>,
    dead_letters: Arc<DeadLetterProducer>,
}

impl WeatherEventConsumer {
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        jetstream: &jetstream::Context,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        max_wait_secs: u64,
        policy: RetryPolicy,
        handler: Arc<dyn WeatherMessageHandler>,
        dead_letters: Arc<DeadLetterProducer>,
    ) -> Result<Self> {
        debug!(
            stream = stream_name,
            consumer = consumer_name,
            subject = subject_filter,
            "Creating JetStream consumer"
        );

        let consumer = jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: subject_filter.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                stream_name,
            )
            .await
            .context("Failed to create consumer")?;

        info!(
            stream = stream_name,
            consumer = consumer_name,
            "Consumer created successfully"
        );

        Ok(Self {
            consumer,
            stream_name: stream_name.to_string(),
            consumer_name: consumer_name.to_string(),
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            policy,
            handler,
            dead_letters,
        })
    }

    /// Run the worker loop until cancellation.
    ///
    /// Cancellation is only observed between fetches: a batch that is already
    /// being processed runs to its acks/naks before the worker stops, so
    /// shutdown never acknowledges a message as a side effect.
    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "Starting consumer loop"
        );

        loop {
            let batch = tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping consumer");
                    break;
                }
                batch = self.fetch_batch() => batch,
            };

            match batch {
                Ok(messages) => {
                    for message in &messages {
                        self.process_message(message).await;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error fetching batch");
                    // Continue consuming despite errors
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        info!("Consumer stopped gracefully");
        Ok(())
    }

    async fn fetch_batch(&self) -> Result<Vec<Message>> {
        debug!(
            batch_size = self.batch_size,
            max_wait_secs = self.max_wait.as_secs(),
            "Fetching message batch"
        );

        let mut messages = self
            .consumer
            .fetch()
            .max_messages(self.batch_size)
            .expires(self.max_wait)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut batch = Vec::new();
        while let Some(result) = messages.next().await {
            match result {
                Ok(msg) => batch.push(msg),
                Err(e) => {
                    warn!(error = %e, "Error receiving message from batch");
                }
            }
        }

        if !batch.is_empty() {
            debug!(message_count = batch.len(), "Received message batch");
        }

        Ok(batch)
    }

    async fn process_message(&self, message: &Message) {
        let subject = message.subject.to_string();

        let result = self.handler.handle(&subject, &message.payload).await;

        let error = match result {
            Ok(()) => {
                self.ack(message).await;
                return;
            }
            Err(error) => error,
        };

        let delivered = message.info().map(|info| info.delivered).unwrap_or(1);

        match disposition_for(&error, delivered, &self.policy) {
            Disposition::Discard => {
                error!(
                    subject = %subject,
                    payload = %String::from_utf8_lossy(&message.payload),
                    error = %error,
                    "Corrupted message, discarding without retry"
                );
                self.ack(message).await;
            }
            Disposition::Retry(delay) => {
                warn!(
                    subject = %subject,
                    attempt = delivered,
                    max_attempts = self.policy.max_attempts,
                    error = %error,
                    "Processing failed, scheduling redelivery"
                );
                if let Err(e) = message.ack_with(AckKind::Nak(Some(delay))).await {
                    error!(subject = %subject, error = %e, "Failed to reject message");
                }
            }
            Disposition::DeadLetter => {
                error!(
                    subject = %subject,
                    payload = %String::from_utf8_lossy(&message.payload),
                    attempts = delivered,
                    error = %error,
                    "Message failed after all retries, sending to dead-letter stream"
                );
                match self
                    .dead_letters
                    .publish(&subject, message.payload.clone(), &error.to_string())
                    .await
                {
                    Ok(()) => self.ack(message).await,
                    Err(e) => {
                        // Keep the message unacknowledged; the next
                        // redelivery will attempt the dead-letter again.
                        error!(subject = %subject, error = %e, "Failed to publish to dead-letter stream");
                        if let Err(e) = message
                            .ack_with(AckKind::Nak(Some(self.policy.retry_delay)))
                            .await
                        {
                            error!(subject = %subject, error = %e, "Failed to reject message");
                        }
                    }
                }
            }
        }
    }

    async fn ack(&self, message: &Message) {
        if let Err(e) = message.ack().await {
            error!(
                subject = %message.subject,
                error = %e,
                "Failed to acknowledge message"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_domain::{
        BroadcastError, DecodeError, PersistenceError, ProcessingError,
    };

    fn decode_error() -> HandleError {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        HandleError::Decode(DecodeError::Malformed(parse_err))
    }

    fn persistence_error() -> HandleError {
        HandleError::Processing(ProcessingError::Persistence(PersistenceError(
            anyhow::anyhow!("store unavailable"),
        )))
    }

    fn broadcast_error() -> HandleError {
        HandleError::Processing(ProcessingError::Broadcast(BroadcastError(
            anyhow::anyhow!("channel gone"),
        )))
    }

    #[test]
    fn decode_failures_are_discarded_on_first_delivery() {
        let policy = RetryPolicy::default();
        assert_eq!(
            disposition_for(&decode_error(), 1, &policy),
            Disposition::Discard
        );
    }

    #[test]
    fn decode_failures_never_reach_the_dead_letter_stream() {
        let policy = RetryPolicy::default();
        // Even a redelivered malformed message is discarded, not dead-lettered
        assert_eq!(
            disposition_for(&decode_error(), policy.max_attempts, &policy),
            Disposition::Discard
        );
    }

    #[test]
    fn retryable_failures_are_redelivered_with_fixed_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(
            disposition_for(&persistence_error(), 1, &policy),
            Disposition::Retry(Duration::from_secs(1))
        );
        assert_eq!(
            disposition_for(&persistence_error(), 2, &policy),
            Disposition::Retry(Duration::from_secs(1))
        );
    }

    #[test]
    fn third_failed_attempt_is_dead_lettered() {
        let policy = RetryPolicy::default();
        assert_eq!(
            disposition_for(&persistence_error(), 3, &policy),
            Disposition::DeadLetter
        );
        assert_eq!(
            disposition_for(&broadcast_error(), 3, &policy),
            Disposition::DeadLetter
        );
    }

    #[test]
    fn deliveries_beyond_the_bound_still_dead_letter() {
        // Covers redelivery after a failed dead-letter publish
        let policy = RetryPolicy::default();
        assert_eq!(
            disposition_for(&persistence_error(), 5, &policy),
            Disposition::DeadLetter
        );
    }
}
