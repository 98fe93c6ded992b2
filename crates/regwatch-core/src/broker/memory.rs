//! In-process FIFO broker.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{RegwatchError, RegwatchResult};
use crate::traits::{AckMode, MessageHandler, QueuePublisher, QueueSubscriber};
use crate::types::Envelope;

/// Deliveries attempted before a message that keeps crashing its handler
/// is dropped.
pub const DEFAULT_MAX_DELIVERIES: u32 = 5;

#[derive(Debug, Clone)]
struct Queued {
    envelope: Envelope,
    deliveries: u32,
}

#[derive(Default)]
struct Inner {
    queues: Mutex<HashMap<String, VecDeque<Queued>>>,
    arrivals: Notify,
    offline: AtomicBool,
}

/// A durable-looking queue that lives in memory.
///
/// Messages are delivered in publish order, one at a time. With
/// [`AckMode::Client`] a handler that panics leaves its message
/// unacknowledged and it is delivered again; with [`AckMode::Auto`] the
/// message is gone as soon as it is received.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
    max_deliveries: u32,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            max_deliveries: DEFAULT_MAX_DELIVERIES,
        }
    }

    /// Cap on redeliveries of a message whose handler panics.
    pub fn with_max_deliveries(mut self, max_deliveries: u32) -> Self {
        self.max_deliveries = max_deliveries.max(1);
        self
    }

    /// Simulate the broker going away or coming back.
    pub fn set_online(&self, online: bool) {
        self.inner.offline.store(!online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        !self.inner.offline.load(Ordering::SeqCst)
    }

    /// Messages waiting on a destination, oldest first.
    pub async fn pending(&self, destination: &str) -> Vec<Envelope> {
        self.inner
            .queues
            .lock()
            .await
            .get(destination)
            .map(|q| q.iter().map(|m| m.envelope.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of messages waiting on a destination.
    pub async fn len(&self, destination: &str) -> usize {
        self.inner
            .queues
            .lock()
            .await
            .get(destination)
            .map_or(0, VecDeque::len)
    }

    pub async fn is_empty(&self, destination: &str) -> bool {
        self.len(destination).await == 0
    }

    async fn enqueue_front(&self, destination: &str, message: Queued) {
        self.inner
            .queues
            .lock()
            .await
            .entry(destination.to_string())
            .or_default()
            .push_front(message);
        self.inner.arrivals.notify_one();
    }

    async fn next_message(&self, destination: &str) -> Queued {
        loop {
            if let Some(message) = self
                .inner
                .queues
                .lock()
                .await
                .get_mut(destination)
                .and_then(VecDeque::pop_front)
            {
                return message;
            }
            self.inner.arrivals.notified().await;
        }
    }

    async fn deliver(
        &self,
        destination: &str,
        ack_mode: AckMode,
        handler: &Arc<dyn MessageHandler>,
        mut message: Queued,
    ) {
        message.deliveries += 1;
        let filename = message.envelope.filename().to_string();
        if ack_mode == AckMode::Auto {
            debug!(filename = %filename, "Acknowledged on receipt");
        }

        let task = {
            let handler = Arc::clone(handler);
            let envelope = message.envelope.clone();
            tokio::spawn(async move { handler.on_message(envelope).await })
        };

        match task.await {
            Ok(result) => {
                debug!(filename = %filename, status = %result.status, "Handler finished");
            }
            Err(e) if ack_mode == AckMode::Client && message.deliveries < self.max_deliveries => {
                warn!(
                    filename = %filename,
                    deliveries = message.deliveries,
                    error = %e,
                    "Handler did not complete, message will be redelivered"
                );
                self.enqueue_front(destination, message).await;
            }
            Err(e) => {
                error!(
                    filename = %filename,
                    deliveries = message.deliveries,
                    ack_mode = %ack_mode,
                    error = %e,
                    "Handler did not complete, message dropped"
                );
            }
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueuePublisher for InMemoryBroker {
    async fn publish(&self, destination: &str, envelope: &Envelope) -> RegwatchResult<()> {
        if !self.is_online() {
            return Err(RegwatchError::publish(format!(
                "broker offline, cannot publish to {}",
                destination
            )));
        }

        self.inner
            .queues
            .lock()
            .await
            .entry(destination.to_string())
            .or_default()
            .push_back(Queued {
                envelope: envelope.clone(),
                deliveries: 0,
            });
        self.inner.arrivals.notify_one();
        Ok(())
    }
}

#[async_trait]
impl QueueSubscriber for InMemoryBroker {
    async fn subscribe(
        &self,
        destination: &str,
        ack_mode: AckMode,
        handler: Arc<dyn MessageHandler>,
        shutdown: CancellationToken,
    ) -> RegwatchResult<()> {
        if !self.is_online() {
            return Err(RegwatchError::subscribe(format!(
                "broker offline, cannot subscribe to {}",
                destination
            )));
        }
        info!(destination, ack_mode = %ack_mode, "Subscribed");

        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                message = self.next_message(destination) => message,
            };
            self.deliver(destination, ack_mode, &handler, message).await;
        }

        info!(destination, "Subscription stopped");
        Ok(())
    }
}
