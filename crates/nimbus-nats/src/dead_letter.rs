use anyhow::{Context, Result};
use async_nats::jetstream;
use async_nats::HeaderMap;
use bytes::Bytes;
use tracing::{info, warn};

/// Header carrying the subject a dead-lettered message was originally
/// published to.
pub const ORIGINAL_SUBJECT_HEADER: &str = "Nimbus-Original-Subject";
/// Header carrying the terminal processing error.
pub const ERROR_HEADER: &str = "Nimbus-Error";

/// Publishes exhausted messages to the dead-letter stream.
///
/// The payload is forwarded verbatim; provenance travels in headers so the
/// dead-letter stream stays independently consumable for inspection.
pub struct DeadLetterProducer {
    jetstream: jetstream::Context,
    base_subject: String,
}

impl DeadLetterProducer {
    pub fn new(jetstream: jetstream::Context, base_subject: String) -> Self {
        info!(
            "Created DeadLetterProducer with base subject: {}",
            base_subject
        );
        Self {
            jetstream,
            base_subject,
        }
    }

    pub async fn publish(
        &self,
        original_subject: &str,
        payload: Bytes,
        error: &str,
    ) -> Result<()> {
        let subject = format!("{}.{}", self.base_subject, original_subject);

        let mut headers = HeaderMap::new();
        headers.insert(ORIGINAL_SUBJECT_HEADER, original_subject);
        headers.insert(ERROR_HEADER, error);

        warn!(
            subject = %subject,
            original_subject = %original_subject,
            size_bytes = payload.len(),
            "Publishing message to dead-letter stream"
        );

        let ack = self
            .jetstream
            .publish_with_headers(subject, headers, payload)
            .await
            .context("Failed to publish message to dead-letter stream")?;

        ack.await
            .context("Failed to receive dead-letter acknowledgment")?;

        Ok(())
    }
}
