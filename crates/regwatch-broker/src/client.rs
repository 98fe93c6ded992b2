//! Connection to a JetStream-enabled NATS server and stream setup.

use std::sync::Arc;

use async_nats::jetstream::{
    self,
    stream::{Config as StreamConfig, RetentionPolicy, StorageType},
};
use tracing::{info, warn};

use regwatch_core::config::BrokerConfig;
use regwatch_core::error::{RegwatchError, RegwatchResult};

use crate::publisher::NatsPublisher;
use crate::subscriber::NatsSubscriber;

/// Connection to a NATS server with JetStream enabled.
pub struct NatsBroker {
    client: async_nats::Client,
    jetstream: jetstream::Context,
    config: BrokerConfig,
}

impl NatsBroker {
    /// Connect to the server named in `config`.
    pub async fn connect(config: &BrokerConfig) -> RegwatchResult<Self> {
        info!(url = %config.url, timeout_ms = config.connect_timeout().as_millis(), "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(config.connect_timeout())
            .connect(config.url.as_str())
            .await
            .map_err(|e| {
                RegwatchError::connection(format!("Failed to connect to NATS at {}", config.url))
                    .with_source(e)
            })?;

        let jetstream = jetstream::new(client.clone());

        info!("Successfully connected to NATS");
        Ok(Self {
            client,
            jetstream,
            config: config.clone(),
        })
    }

    /// Make sure the work-queue stream that captures the destination exists.
    pub async fn ensure_stream(&self) -> RegwatchResult<()> {
        let name = self.config.stream.as_str();
        info!(stream = %name, "Ensuring stream exists");

        match self.jetstream.get_stream(name).await {
            Ok(_) => {
                info!(stream = %name, "Stream already exists");
            }
            Err(_) => {
                self.jetstream
                    .create_stream(stream_config(&self.config))
                    .await
                    .map_err(|e| {
                        RegwatchError::connection(format!("Failed to create stream '{}'", name))
                            .with_source(e)
                    })?;
                info!(stream = %name, "Created stream");
            }
        }

        Ok(())
    }

    pub fn publisher(&self) -> NatsPublisher {
        NatsPublisher::new(Arc::new(self.jetstream.clone()))
    }

    pub fn subscriber(&self) -> NatsSubscriber {
        NatsSubscriber::new(self.jetstream.clone(), self.config.clone())
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Flush pending publishes and drain subscriptions.
    pub async fn close(self) {
        info!("Closing NATS connection");
        if let Err(e) = self.client.flush().await {
            warn!(error = %e, "Failed to flush NATS connection");
        }
        if let Err(e) = self.client.drain().await {
            warn!(error = %e, "Failed to drain NATS connection");
        }
    }
}

/// Subject wildcard covering every destination under the first token of
/// `destination`, e.g. `regulation.incoming` -> `regulation.>`.
fn stream_subjects(destination: &str) -> String {
    match destination.split_once('.') {
        Some((root, _)) => format!("{}.>", root),
        None => destination.to_string(),
    }
}

fn stream_config(config: &BrokerConfig) -> StreamConfig {
    StreamConfig {
        name: config.stream.clone(),
        subjects: vec![stream_subjects(&config.destination)],
        description: Some("Regulatory documents awaiting ingestion".to_string()),
        retention: RetentionPolicy::WorkQueue,
        storage: StorageType::File,
        ..Default::default()
    }
}
