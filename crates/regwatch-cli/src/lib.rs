//! regwatch-cli - wiring for the `regwatch` binary.
//!
//! [`PipelineContext`] owns the broker connection for one run and builds
//! the producer and the ingestion agent from a [`PipelineConfig`].
//!
//! [`PipelineConfig`]: regwatch_core::PipelineConfig

mod context;
mod telemetry;

pub use context::{build_agent, build_sinks, PipelineContext};
pub use telemetry::init_tracing;
