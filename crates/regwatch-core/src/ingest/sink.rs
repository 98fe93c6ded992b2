//! Built-in document sinks.

use std::path::PathBuf;

use async_trait::async_trait;
use regwatch_extractors::ExtractedDocument;
use tracing::info;

use crate::error::{ErrorCode, RegwatchError, RegwatchResult};
use crate::traits::DocumentSink;
use crate::types::base_filename;

/// Logs each parsed regulation as pretty-printed JSON.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl DocumentSink for LogSink {
    async fn forward(&self, document: &ExtractedDocument) -> RegwatchResult<()> {
        let json = serde_json::to_string_pretty(&document.to_json())?;
        info!(
            regulation_id = %document.regulation_id,
            sections = document.sections.len(),
            "Parsed regulation:\n{}",
            json
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Writes each parsed regulation to `<dir>/<filename>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output path for a regulation.
    pub fn path_for(&self, regulation_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", base_filename(regulation_id)))
    }
}

#[async_trait]
impl DocumentSink for JsonFileSink {
    async fn forward(&self, document: &ExtractedDocument) -> RegwatchResult<()> {
        let path = self.path_for(&document.regulation_id);
        let json = serde_json::to_vec_pretty(&document.to_json())?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            RegwatchError::persist_io(
                format!("failed to create {}", self.dir.display()),
                ErrorCode::PerWriteFailed,
                e,
            )
        })?;
        tokio::fs::write(&path, json).await.map_err(|e| {
            RegwatchError::persist_io(
                format!("failed to write {}", path.display()),
                ErrorCode::PerWriteFailed,
                e,
            )
        })?;

        info!(path = %path.display(), "Stored parsed regulation");
        Ok(())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regwatch_extractors::Section;

    fn sample() -> ExtractedDocument {
        ExtractedDocument {
            regulation_id: "reg1.pdf".into(),
            title: "reg1".into(),
            sections: vec![Section::numbered(1, "Intro")],
            raw_text: "Intro".into(),
        }
    }

    #[tokio::test]
    async fn test_log_sink_accepts_documents() {
        assert!(LogSink.forward(&sample()).await.is_ok());
        assert_eq!(LogSink.name(), "log");
    }

    #[tokio::test]
    async fn test_json_file_sink_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("parsed"));

        sink.forward(&sample()).await.unwrap();

        let written = std::fs::read(dir.path().join("parsed/reg1.pdf.json")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(value["title"], "reg1");
        assert_eq!(value["sections"][0]["section"], "Section 1");
    }
}
