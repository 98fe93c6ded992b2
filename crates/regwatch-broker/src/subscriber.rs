//! Durable pull consumer that feeds envelopes to a message handler.

use std::sync::Arc;

use async_nats::jetstream::{self, consumer::pull};
use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use regwatch_core::config::BrokerConfig;
use regwatch_core::error::{RegwatchError, RegwatchResult};
use regwatch_core::traits::{AckMode, MessageHandler, QueueSubscriber};
use regwatch_core::types::ProcessingResult;

use crate::traits::Delivery;

/// Queue subscriber backed by a durable JetStream pull consumer.
pub struct NatsSubscriber {
    jetstream: jetstream::Context,
    config: BrokerConfig,
}

impl NatsSubscriber {
    pub fn new(jetstream: jetstream::Context, config: BrokerConfig) -> Self {
        Self { jetstream, config }
    }

    fn consumer_config(&self, destination: &str) -> pull::Config {
        consumer_config(&self.config, destination)
    }
}

fn consumer_config(config: &BrokerConfig, destination: &str) -> pull::Config {
    pull::Config {
        name: Some(config.consumer_name.clone()),
        durable_name: Some(config.consumer_name.clone()),
        filter_subject: destination.to_string(),
        ack_policy: jetstream::consumer::AckPolicy::Explicit,
        ack_wait: config.ack_wait(),
        max_deliver: config.max_deliver,
        ..Default::default()
    }
}

#[async_trait]
impl QueueSubscriber for NatsSubscriber {
    async fn subscribe(
        &self,
        destination: &str,
        ack_mode: AckMode,
        handler: Arc<dyn MessageHandler>,
        shutdown: CancellationToken,
    ) -> RegwatchResult<()> {
        debug!(
            stream = %self.config.stream,
            consumer = %self.config.consumer_name,
            subject = destination,
            "Creating JetStream consumer"
        );

        let consumer = self
            .jetstream
            .create_consumer_on_stream(self.consumer_config(destination), self.config.stream.as_str())
            .await
            .map_err(|e| {
                RegwatchError::subscribe(format!(
                    "Failed to create consumer '{}'",
                    self.config.consumer_name
                ))
                .with_source(e)
            })?;

        let mut messages = consumer.messages().await.map_err(|e| {
            RegwatchError::subscribe("Failed to open message stream").with_source(e)
        })?;

        info!(subject = destination, ack_mode = %ack_mode, "Subscribed, waiting for documents");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Received shutdown signal, stopping subscription");
                    break;
                }
                next = messages.next() => match next {
                    Some(Ok(message)) => {
                        deliver(&message, ack_mode, Arc::clone(&handler)).await;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Error receiving message");
                    }
                    None => {
                        warn!("Message stream ended");
                        break;
                    }
                }
            }
        }

        info!("Subscription stopped");
        Ok(())
    }
}

/// Hand one delivery to the handler and settle it with the broker.
///
/// Auto mode acks before the handler runs. Client mode acks once the handler
/// returns, whatever the outcome, and naks if the handler panicked so the
/// message is redelivered. Returns `None` when the handler panicked.
pub(crate) async fn deliver(
    delivery: &dyn Delivery,
    ack_mode: AckMode,
    handler: Arc<dyn MessageHandler>,
) -> Option<ProcessingResult> {
    let envelope = delivery.envelope();
    let filename = envelope.filename().to_string();

    let delivered = delivery.delivered();
    if delivered > 1 {
        info!(filename = %filename, delivered, "Redelivered message");
    }

    if ack_mode == AckMode::Auto {
        if let Err(e) = delivery.ack().await {
            warn!(filename = %filename, error = %e, "Failed to ack on receipt");
        }
    }

    let outcome = tokio::spawn(async move { handler.on_message(envelope).await }).await;

    match outcome {
        Ok(result) => {
            if ack_mode == AckMode::Client {
                if let Err(e) = delivery.ack().await {
                    warn!(filename = %filename, error = %e, "Failed to ack processed message");
                }
            }
            Some(result)
        }
        Err(e) => {
            error!(filename = %filename, error = %e, "Handler crashed");
            if ack_mode == AckMode::Client {
                if let Err(e) = delivery.nak().await {
                    warn!(filename = %filename, error = %e, "Failed to nak crashed message");
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use regwatch_core::types::{Envelope, ProcessingStatus};

    use crate::traits::MockDelivery;

    struct RecordingHandler {
        acked: Arc<AtomicBool>,
        acked_before_run: Mutex<Vec<bool>>,
        crash: bool,
    }

    impl RecordingHandler {
        fn new(acked: Arc<AtomicBool>, crash: bool) -> Arc<Self> {
            Arc::new(Self {
                acked,
                acked_before_run: Mutex::new(Vec::new()),
                crash,
            })
        }
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn on_message(&self, envelope: Envelope) -> ProcessingResult {
            self.acked_before_run
                .lock()
                .unwrap()
                .push(self.acked.load(Ordering::SeqCst));
            if self.crash {
                panic!("handler crashed");
            }
            let mut result = ProcessingResult::pending(envelope.filename());
            result.advance(ProcessingStatus::Parsed);
            result
        }
    }

    fn delivery(acked: Arc<AtomicBool>, acks: usize, naks: usize) -> MockDelivery {
        let mut mock = MockDelivery::new();
        mock.expect_envelope()
            .returning(|| Envelope::new("reg1.pdf", "application/pdf", "JVBERi0="));
        mock.expect_delivered().return_const(1i64);
        mock.expect_ack().times(acks).returning(move || {
            acked.store(true, Ordering::SeqCst);
            Ok(())
        });
        mock.expect_nak().times(naks).returning(|| Ok(()));
        mock
    }

    #[tokio::test]
    async fn test_client_mode_acks_after_handler() {
        let acked = Arc::new(AtomicBool::new(false));
        let handler = RecordingHandler::new(Arc::clone(&acked), false);
        let mock = delivery(Arc::clone(&acked), 1, 0);

        let result = deliver(&mock, AckMode::Client, handler.clone()).await.unwrap();

        assert_eq!(result.status, ProcessingStatus::Parsed);
        assert_eq!(*handler.acked_before_run.lock().unwrap(), vec![false]);
        assert!(acked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_auto_mode_acks_on_receipt() {
        let acked = Arc::new(AtomicBool::new(false));
        let handler = RecordingHandler::new(Arc::clone(&acked), false);
        let mock = delivery(Arc::clone(&acked), 1, 0);

        deliver(&mock, AckMode::Auto, handler.clone()).await.unwrap();

        assert_eq!(*handler.acked_before_run.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_client_mode_naks_on_crash() {
        let acked = Arc::new(AtomicBool::new(false));
        let handler = RecordingHandler::new(Arc::clone(&acked), true);
        let mock = delivery(Arc::clone(&acked), 0, 1);

        assert!(deliver(&mock, AckMode::Client, handler).await.is_none());
        assert!(!acked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_auto_mode_crash_loses_message() {
        let acked = Arc::new(AtomicBool::new(false));
        let handler = RecordingHandler::new(Arc::clone(&acked), true);
        let mock = delivery(Arc::clone(&acked), 1, 0);

        assert!(deliver(&mock, AckMode::Auto, handler).await.is_none());
        assert!(acked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_ack_failure_still_returns_result() {
        let handler = RecordingHandler::new(Arc::new(AtomicBool::new(false)), false);
        let mut mock = MockDelivery::new();
        mock.expect_envelope()
            .returning(|| Envelope::new("reg1.pdf", "application/pdf", ""));
        mock.expect_delivered().return_const(3i64);
        mock.expect_ack()
            .times(1)
            .returning(|| Err(RegwatchError::subscribe("connection lost")));

        let result = deliver(&mock, AckMode::Client, handler).await.unwrap();
        assert_eq!(result.filename, "reg1.pdf");
    }

    #[test]
    fn test_consumer_config() {
        let config = BrokerConfig::default();
        let pull = consumer_config(&config, "regulation.incoming");

        assert_eq!(pull.durable_name.as_deref(), Some("regwatch-monitor"));
        assert_eq!(pull.filter_subject, "regulation.incoming");
        assert_eq!(pull.ack_policy, jetstream::consumer::AckPolicy::Explicit);
        assert_eq!(pull.ack_wait, config.ack_wait());
        assert_eq!(pull.max_deliver, 5);
    }
}
