//! Core types for regwatch.

mod document;
mod message;
mod result;

pub use document::*;
pub use message::*;
pub use result::*;
