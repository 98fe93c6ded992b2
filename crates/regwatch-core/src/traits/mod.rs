//! Core traits for regwatch collaborators.

mod broker;
mod llm;
mod sink;
mod store;

pub use broker::*;
pub use llm::*;
pub use sink::*;
pub use store::*;
