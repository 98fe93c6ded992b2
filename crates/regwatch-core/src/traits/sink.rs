//! Downstream sink for extracted documents.

use async_trait::async_trait;
use regwatch_extractors::ExtractedDocument;

use crate::error::RegwatchResult;

/// Receives every successfully extracted document.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Forward one document downstream.
    async fn forward(&self, document: &ExtractedDocument) -> RegwatchResult<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}
