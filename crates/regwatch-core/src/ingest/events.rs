//! Broadcast of per-message outcomes.
//!
//! Every terminal [`ProcessingResult`] is published here in the order the
//! agent finished it. Slow subscribers miss events rather than blocking
//! the agent.

use tokio::sync::broadcast;

use crate::types::ProcessingResult;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// Event bus for ingestion outcomes.
///
/// Events are fire-and-forget; with no subscribers they are dropped.
#[derive(Clone)]
pub struct IngestEvents {
    sender: broadcast::Sender<ProcessingResult>,
}

impl IngestEvents {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to outcomes emitted after this call.
    pub fn subscribe(&self) -> IngestSubscriber {
        IngestSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    /// Emit an outcome to all subscribers
    pub fn emit(&self, result: ProcessingResult) {
        let _ = self.sender.send(result);
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for IngestEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber to ingestion outcomes
pub struct IngestSubscriber {
    receiver: broadcast::Receiver<ProcessingResult>,
}

impl IngestSubscriber {
    /// Receive the next outcome
    ///
    /// Returns None once the bus is dropped.
    pub async fn recv(&mut self) -> Option<ProcessingResult> {
        loop {
            match self.receiver.recv().await {
                Ok(result) => return Some(result),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Ingest subscriber lagged by {} events", n);
                    continue;
                }
            }
        }
    }

    /// Try to receive an outcome without blocking
    pub fn try_recv(&mut self) -> Option<ProcessingResult> {
        self.receiver.try_recv().ok()
    }
}
