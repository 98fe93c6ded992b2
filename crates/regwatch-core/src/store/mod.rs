//! Content store implementations.

mod fs;

pub use fs::FsContentStore;

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of stored content, used in logs.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
