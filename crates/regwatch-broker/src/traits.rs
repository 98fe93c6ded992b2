//! Seams over async-nats types so publish and delivery can be mocked.

use async_nats::jetstream;
use async_nats::HeaderMap;
use async_trait::async_trait;
use bytes::Bytes;

use regwatch_core::error::{RegwatchError, RegwatchResult};
use regwatch_core::types::Envelope;

use crate::conversions::envelope_from_parts;

/// Publishes raw messages to JetStream and waits for the stream to store them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JetStreamPublisher: Send + Sync {
    async fn publish(&self, subject: String, headers: HeaderMap, payload: Bytes)
        -> RegwatchResult<()>;
}

/// One message handed out by a pull consumer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Envelope rebuilt from the delivered headers and payload.
    fn envelope(&self) -> Envelope;

    /// How many times the broker has delivered this message, starting at 1.
    fn delivered(&self) -> i64;

    /// Mark the message as handled.
    async fn ack(&self) -> RegwatchResult<()>;

    /// Ask for immediate redelivery.
    async fn nak(&self) -> RegwatchResult<()>;
}

#[async_trait]
impl JetStreamPublisher for jetstream::Context {
    async fn publish(
        &self,
        subject: String,
        headers: HeaderMap,
        payload: Bytes,
    ) -> RegwatchResult<()> {
        let ack = self
            .publish_with_headers(subject, headers, payload)
            .await
            .map_err(|e| RegwatchError::publish("Failed to publish message").with_source(e))?;
        ack.await.map_err(|e| {
            RegwatchError::publish("Stream did not acknowledge the message").with_source(e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl Delivery for jetstream::Message {
    fn envelope(&self) -> Envelope {
        envelope_from_parts(self.headers.as_ref(), &self.payload)
    }

    fn delivered(&self) -> i64 {
        self.info().map(|info| info.delivered).unwrap_or(1)
    }

    async fn ack(&self) -> RegwatchResult<()> {
        jetstream::Message::ack(self)
            .await
            .map_err(|e| RegwatchError::subscribe(format!("Failed to ack message: {}", e)))
    }

    async fn nak(&self) -> RegwatchResult<()> {
        self.ack_with(jetstream::AckKind::Nak(None))
            .await
            .map_err(|e| RegwatchError::subscribe(format!("Failed to nak message: {}", e)))
    }
}
