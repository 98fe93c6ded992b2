//! regwatch-core - Core library for regwatch.
//!
//! This crate provides the codec, the queue contract, the document
//! producer, the ingestion agent and the summary dispatcher of the
//! regulation ingestion pipeline.
//!
//! # Example
//!
//! ```ignore
//! use regwatch_core::{DocumentProducer, IngestionAgent, InMemoryBroker, FsContentStore};
//!
//! let broker = InMemoryBroker::new();
//! let producer = DocumentProducer::new(Arc::new(broker.clone()));
//! producer.publish("reg1.pdf", &bytes).await?;
//!
//! let agent = IngestionAgent::new(Arc::new(FsContentStore::new("mock_folder")), RegulationParser::default());
//! broker.subscribe(DESTINATION, AckMode::Client, Arc::new(agent), shutdown).await?;
//! ```

pub mod broker;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod producer;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use broker::InMemoryBroker;
pub use config::{AgentConfig, BrokerConfig, LlmProvider, PipelineConfig};
pub use dispatch::{AgentResponse, SummaryDispatcher};
pub use error::{ErrorCode, RegwatchError, RegwatchResult};
pub use ingest::{IngestEvents, IngestionAgent, JsonFileSink, LogSink};
pub use producer::{DocumentProducer, PublishReport};
pub use store::FsContentStore;
pub use traits::{
    AckMode, ContentStore, DocumentSink, Llm, LlmConfig, MessageHandler, QueuePublisher,
    QueueSubscriber, SaveOutcome,
};
pub use types::{
    Document, Envelope, Message, MessageRole, ProcessingResult, ProcessingStatus, DESTINATION,
};

pub use regwatch_extractors::{ExtractedDocument, RegulationParser, Section};
