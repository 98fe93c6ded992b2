//! Queue implementations that live in-process.
//!
//! The trait contract is in [`crate::traits`]; the NATS JetStream client is
//! in the `regwatch-broker` crate.

mod memory;

pub use memory::{InMemoryBroker, DEFAULT_MAX_DELIVERIES};
