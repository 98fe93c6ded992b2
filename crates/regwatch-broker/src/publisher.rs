//! JetStream publisher for document envelopes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use regwatch_core::error::RegwatchResult;
use regwatch_core::traits::QueuePublisher;
use regwatch_core::types::Envelope;

use crate::conversions::envelope_to_parts;
use crate::traits::JetStreamPublisher;

/// Queue publisher backed by a JetStream stream.
///
/// A publish only succeeds once the stream has stored the message.
#[derive(Clone)]
pub struct NatsPublisher {
    jetstream: Arc<dyn JetStreamPublisher>,
}

impl NatsPublisher {
    pub fn new(jetstream: Arc<dyn JetStreamPublisher>) -> Self {
        Self { jetstream }
    }
}

#[async_trait]
impl QueuePublisher for NatsPublisher {
    #[instrument(skip(self, envelope), fields(filename = %envelope.filename(), body_len = envelope.body.len()))]
    async fn publish(&self, destination: &str, envelope: &Envelope) -> RegwatchResult<()> {
        let (headers, payload) = envelope_to_parts(envelope);
        self.jetstream
            .publish(destination.to_string(), headers, payload)
            .await?;
        debug!(destination, "Message stored by stream");
        Ok(())
    }
}
