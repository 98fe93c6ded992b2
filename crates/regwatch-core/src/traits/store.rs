//! Content store trait.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RegwatchResult;

/// What a save did to the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SaveOutcome {
    /// No entry existed for the filename.
    Created,
    /// The stored bytes were already identical.
    Unchanged,
    /// Different bytes were replaced (last write wins).
    Overwritten,
}

/// Durable raw-document storage keyed by filename.
///
/// Saves must be idempotent: saving identical bytes twice leaves the same
/// state as saving once.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Persist `bytes` under `filename`.
    async fn save(&self, filename: &str, bytes: &[u8]) -> RegwatchResult<SaveOutcome>;

    /// Read the bytes stored under `filename`.
    async fn load(&self, filename: &str) -> RegwatchResult<Vec<u8>>;

    /// Check whether an entry exists for `filename`.
    async fn exists(&self, filename: &str) -> RegwatchResult<bool>;
}
