//! regwatch-broker - NATS JetStream backing for the regwatch queue contract.
//!
//! Envelopes travel as JetStream messages: the `filename` and `contentType`
//! envelope headers become NATS headers and the encoded body is the payload.
//! Subscriptions use a durable pull consumer with explicit acks, so a
//! consumer that dies before acking gets the message redelivered.
//!
//! ```ignore
//! use regwatch_broker::NatsBroker;
//! use regwatch_core::BrokerConfig;
//!
//! let broker = NatsBroker::connect(&BrokerConfig::default()).await?;
//! broker.ensure_stream().await?;
//! let publisher = broker.publisher();
//! ```

mod client;
mod conversions;
mod publisher;
mod subscriber;
mod traits;

pub use client::NatsBroker;
pub use conversions::{envelope_from_parts, envelope_to_parts};
pub use publisher::NatsPublisher;
pub use subscriber::NatsSubscriber;
pub use traits::{Delivery, JetStreamPublisher};
