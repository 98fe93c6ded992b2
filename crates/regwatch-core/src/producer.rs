//! Document producer: encodes documents and publishes them to the queue.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::RegwatchResult;
use crate::traits::QueuePublisher;
use crate::types::{Document, Envelope, DESTINATION};

/// Outcome of a batch publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Filenames published, in send order.
    pub published: Vec<String>,
    /// Files that could not be read and were not sent.
    pub skipped: Vec<String>,
}

/// Publishes documents one message each.
///
/// There is no internal retry. A failed publish returns the connection
/// error and enqueues nothing.
#[derive(Clone)]
pub struct DocumentProducer {
    publisher: Arc<dyn QueuePublisher>,
    destination: String,
    pacing: Duration,
}

impl DocumentProducer {
    pub fn new(publisher: Arc<dyn QueuePublisher>) -> Self {
        Self {
            publisher,
            destination: DESTINATION.to_string(),
            pacing: Duration::ZERO,
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Delay between consecutive sends in a batch. Zero disables pacing.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Publish raw PDF bytes under `filename`.
    pub async fn publish(&self, filename: &str, bytes: &[u8]) -> RegwatchResult<()> {
        self.publish_document(&Document::pdf(filename, bytes.to_vec()))
            .await
    }

    /// Publish an already-built document.
    pub async fn publish_document(&self, document: &Document) -> RegwatchResult<()> {
        let envelope = Envelope::encode(document);
        self.publisher.publish(&self.destination, &envelope).await?;
        info!(
            filename = %document.filename,
            destination = %self.destination,
            size = document.bytes.len(),
            "Published document"
        );
        Ok(())
    }

    /// Read a file and publish it under its base filename.
    pub async fn publish_file(&self, path: impl AsRef<Path>) -> RegwatchResult<String> {
        let document = Document::from_path(path).await?;
        self.publish_document(&document).await?;
        Ok(document.filename)
    }

    /// Publish documents in order, sleeping `pacing` between sends.
    pub async fn publish_all(
        &self,
        documents: impl IntoIterator<Item = Document>,
    ) -> RegwatchResult<PublishReport> {
        let mut report = PublishReport::default();
        for document in documents {
            if !report.published.is_empty() {
                self.pace().await;
            }
            self.publish_document(&document).await?;
            report.published.push(document.filename);
        }
        Ok(report)
    }

    /// Publish every `*.pdf` in `dir`, sorted by name.
    ///
    /// Unreadable files are skipped with a warning. The first connection
    /// error aborts the batch.
    pub async fn publish_dir(&self, dir: impl AsRef<Path>) -> RegwatchResult<PublishReport> {
        let dir = dir.as_ref();
        let files = list_pdfs(dir).await?;
        info!(dir = %dir.display(), count = files.len(), "Publishing directory");

        let mut report = PublishReport::default();
        for path in files {
            let document = match Document::from_path(&path).await {
                Ok(document) => document,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                    report.skipped.push(path.display().to_string());
                    continue;
                }
            };

            if !report.published.is_empty() {
                self.pace().await;
            }
            self.publish_document(&document).await?;
            report.published.push(document.filename);
        }

        info!(
            published = report.published.len(),
            skipped = report.skipped.len(),
            "Finished publishing directory"
        );
        Ok(report)
    }

    async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}

/// Files in `dir` with a `.pdf` extension (any case), sorted by path.
async fn list_pdfs(dir: &Path) -> RegwatchResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
