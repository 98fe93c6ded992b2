//! Text-safe transport encoding for document bytes.
//!
//! Documents travel as standard, padded base64 so they survive brokers and
//! frame formats that only carry text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{RegwatchError, RegwatchResult};

/// Encode bytes as base64 text.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 text back into bytes.
///
/// ASCII whitespace anywhere in the input is ignored so that line-wrapped
/// bodies decode the same as single-line ones.
pub fn decode(text: &str) -> RegwatchResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RegwatchError::decode(format!("invalid base64 body: {}", e)))
}
