use anyhow::Context;
use async_nats::jetstream;
use async_trait::async_trait;
use nimbus_domain::{codec, PublishError, WeatherEvent, WeatherEventPublisher};
use tracing::{debug, info};

/// JetStream producer for weather events.
///
/// Events are published to `{base_subject}.{city-slug}` so that ordering is
/// preserved per city while different cities land on independent subjects.
pub struct WeatherEventProducer {
    jetstream: jetstream::Context,
    base_subject: String,
}

impl WeatherEventProducer {
    pub fn new(jetstream: jetstream::Context, base_subject: String) -> Self {
        info!(
            "Created WeatherEventProducer with base subject: {}",
            base_subject
        );
        Self {
            jetstream,
            base_subject,
        }
    }
}

#[async_trait]
impl WeatherEventPublisher for WeatherEventProducer {
    async fn publish(&self, event: &WeatherEvent) -> Result<(), PublishError> {
        let payload = codec::encode(event).map_err(anyhow::Error::from)?;
        let subject = format!("{}.{}", self.base_subject, city_slug(&event.city));

        debug!(
            subject = %subject,
            city = %event.city,
            condition = %event.condition,
            size_bytes = payload.len(),
            "Publishing weather event"
        );

        let ack = self
            .jetstream
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish message to JetStream")?;

        ack.await
            .context("Failed to receive JetStream acknowledgment")?;

        debug!(
            subject = %subject,
            city = %event.city,
            "Successfully published and acknowledged"
        );

        Ok(())
    }
}

/// Turn a city label into a NATS subject token: lowercase, alphanumeric runs
/// joined by single dashes.
pub fn city_slug(city: &str) -> String {
    let mut slug = String::with_capacity(city.len());
    let mut pending_dash = false;
    for c in city.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_city_labels() {
        assert_eq!(city_slug("Athlone, IE"), "athlone-ie");
        assert_eq!(city_slug("New York, US"), "new-york-us");
        assert_eq!(city_slug("galway"), "galway");
    }

    #[test]
    fn slug_never_produces_empty_token() {
        assert_eq!(city_slug("***"), "unknown");
    }
}
