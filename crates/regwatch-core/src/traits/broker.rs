//! Queue contract between producers, the broker, and consumers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::RegwatchResult;
use crate::types::{Envelope, ProcessingResult};

/// When a delivered message is acknowledged to the broker.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AckMode {
    /// Acknowledge after the handler returns; a crash mid-processing
    /// leads to redelivery.
    #[default]
    Client,
    /// Acknowledge on receipt, before the handler runs; a crash
    /// mid-processing loses the message.
    Auto,
}

/// Publishes envelopes to a destination.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Enqueue exactly one message, or fail with a connection error and
    /// enqueue nothing.
    async fn publish(&self, destination: &str, envelope: &Envelope) -> RegwatchResult<()>;
}

/// Callback invoked once per delivered message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one message to a terminal result. Must not panic on bad input.
    async fn on_message(&self, envelope: Envelope) -> ProcessingResult;
}

/// Delivers messages from a destination to a handler.
#[async_trait]
pub trait QueueSubscriber: Send + Sync {
    /// Run the subscription until `shutdown` is cancelled.
    ///
    /// Messages are handed to `handler` one at a time, each running to
    /// completion before the next. Only failing to establish the
    /// subscription returns an error.
    async fn subscribe(
        &self,
        destination: &str,
        ack_mode: AckMode,
        handler: Arc<dyn MessageHandler>,
        shutdown: CancellationToken,
    ) -> RegwatchResult<()>;
}
