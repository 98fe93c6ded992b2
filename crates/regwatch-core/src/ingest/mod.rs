//! Consumer side of the pipeline.

mod agent;
mod events;
mod sink;

pub use agent::IngestionAgent;
pub use events::{IngestEvents, IngestSubscriber};
pub use sink::{JsonFileSink, LogSink};
