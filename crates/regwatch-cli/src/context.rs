//! Broker connection and agent wiring for the CLI commands.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use regwatch_broker::NatsBroker;
use regwatch_core::error::RegwatchResult;
use regwatch_core::traits::{AckMode, DocumentSink, QueueSubscriber};
use regwatch_core::{
    AgentConfig, DocumentProducer, FsContentStore, IngestionAgent, JsonFileSink, LogSink,
    PipelineConfig, RegulationParser, SummaryDispatcher,
};
use regwatch_llm::LlmFactory;

/// Broker connection and configuration for one run of the pipeline.
///
/// Opened once at startup and closed explicitly on the way out.
pub struct PipelineContext {
    config: PipelineConfig,
    broker: NatsBroker,
}

impl PipelineContext {
    /// Connect to the broker and make sure the destination's stream exists.
    pub async fn open(config: PipelineConfig) -> RegwatchResult<Self> {
        let broker = NatsBroker::connect(&config.broker).await?;
        broker.ensure_stream().await?;
        Ok(Self { config, broker })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Producer publishing to the configured destination.
    pub fn producer(&self) -> DocumentProducer {
        DocumentProducer::new(Arc::new(self.broker.publisher()))
            .with_destination(self.config.broker.destination.clone())
            .with_pacing(self.config.producer.pacing())
    }

    /// Feed the destination to `agent` until `shutdown` fires.
    pub async fn monitor(
        &self,
        agent: Arc<IngestionAgent>,
        ack_mode: AckMode,
        shutdown: CancellationToken,
    ) -> RegwatchResult<()> {
        info!(
            destination = %self.config.broker.destination,
            content_dir = %self.config.store.content_dir.display(),
            "Monitoring for regulations"
        );
        self.broker
            .subscriber()
            .subscribe(&self.config.broker.destination, ack_mode, agent, shutdown)
            .await
    }

    /// Flush and drain the broker connection.
    pub async fn close(self) {
        self.broker.close().await;
    }
}

/// Build the ingestion agent described by `config`.
pub fn build_agent(config: &PipelineConfig, with_summary: bool) -> IngestionAgent {
    let store = Arc::new(FsContentStore::new(config.store.content_dir.clone()));
    build_sinks(config, with_summary)
        .into_iter()
        .fold(IngestionAgent::new(store, RegulationParser::default()), |agent, sink| {
            agent.with_sink(sink)
        })
}

/// Sinks parsed documents go to, in forwarding order.
///
/// A summary agent that cannot be created is skipped with a warning; the
/// rest of the pipeline runs without it.
pub fn build_sinks(config: &PipelineConfig, with_summary: bool) -> Vec<Arc<dyn DocumentSink>> {
    let mut sinks: Vec<Arc<dyn DocumentSink>> = Vec::new();

    if config.sink.log_documents {
        sinks.push(Arc::new(LogSink));
    }
    if let Some(dir) = &config.sink.output_dir {
        sinks.push(Arc::new(JsonFileSink::new(dir.clone())));
    }
    if with_summary {
        let agent = config.agent.clone().unwrap_or_default();
        match summary_dispatcher(&agent) {
            Ok(dispatcher) => sinks.push(Arc::new(dispatcher)),
            Err(e) => warn!(
                provider = %agent.provider,
                error = %e,
                "Summary agent unavailable, continuing without it"
            ),
        }
    }

    sinks
}

fn summary_dispatcher(agent: &AgentConfig) -> RegwatchResult<SummaryDispatcher> {
    let llm = LlmFactory::from_agent_config(agent)?;
    info!(provider = %agent.provider, model = llm.model_name(), "Summary agent enabled");
    Ok(SummaryDispatcher::new(llm)
        .with_timeout(agent.timeout())
        .with_max_input_chars(agent.max_input_chars)
        .with_temperature(agent.llm.temperature))
}
