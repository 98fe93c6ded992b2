//! The ingestion agent: decode, save, extract, forward.

use std::sync::Arc;

use async_trait::async_trait;
use regwatch_extractors::{ExtractedDocument, RegulationParser};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::events::IngestEvents;
use crate::error::{RegwatchError, RegwatchResult};
use crate::traits::{ContentStore, DocumentSink, MessageHandler};
use crate::types::{base_filename, Envelope, ProcessingResult, ProcessingStatus};

/// Processes delivered envelopes one at a time.
///
/// Each message runs `decode -> save -> extract -> forward` to a terminal
/// [`ProcessingResult`]. Failures are contained to the message: they are
/// logged, reported, and never propagate to the subscription loop.
pub struct IngestionAgent {
    store: Arc<dyn ContentStore>,
    parser: RegulationParser,
    sinks: Vec<Arc<dyn DocumentSink>>,
    events: IngestEvents,
}

impl IngestionAgent {
    /// Create an agent with no sinks.
    pub fn new(store: Arc<dyn ContentStore>, parser: RegulationParser) -> Self {
        Self {
            store,
            parser,
            sinks: Vec::new(),
            events: IngestEvents::new(),
        }
    }

    /// Add a sink that receives every parsed document.
    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Outcome bus; subscribe before messages start flowing.
    pub fn events(&self) -> &IngestEvents {
        &self.events
    }

    /// Process one envelope to a terminal result.
    pub async fn process(&self, envelope: Envelope) -> ProcessingResult {
        let filename = base_filename(envelope.filename()).to_string();
        let span = info_span!("ingest", filename = %filename);

        async move {
            let mut result = ProcessingResult::pending(&filename);
            debug!(content_type = envelope.content_type(), "Received message");

            match self.run_stages(&filename, &envelope, &mut result).await {
                Ok(document) => {
                    result.advance(ProcessingStatus::Parsed);
                    info!(
                        title = %document.title,
                        sections = document.sections.len(),
                        "Completed parsing"
                    );
                }
                Err(err) => {
                    log_failure(&err, result.status);
                    result.fail(&err);
                }
            }

            self.events.emit(result.clone());
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        filename: &str,
        envelope: &Envelope,
        result: &mut ProcessingResult,
    ) -> RegwatchResult<ExtractedDocument> {
        let bytes = envelope.decode_body()?;
        result.advance(ProcessingStatus::Decoded);

        self.store.save(filename, &bytes).await?;
        result.advance(ProcessingStatus::Saved);

        let persisted = self.store.load(filename).await?;
        let document = self
            .parser
            .parse(filename, &persisted, envelope.content_type())
            .await?;

        for sink in &self.sinks {
            sink.forward(&document).await.map_err(|e| {
                warn!(sink = sink.name(), error = %e, "Sink rejected document");
                e
            })?;
        }

        Ok(document)
    }
}

fn log_failure(err: &RegwatchError, reached: ProcessingStatus) {
    match err {
        RegwatchError::Decode { .. } => {
            warn!(error = %err, code = %err.code(), "Dropping message with undecodable body")
        }
        RegwatchError::Parse { .. } => error!(
            error = %err,
            code = %err.code(),
            "Error parsing document; raw bytes retained for reprocessing"
        ),
        _ => error!(
            error = %err,
            code = %err.code(),
            reached = %reached,
            "Error processing message"
        ),
    }
}

#[async_trait]
impl MessageHandler for IngestionAgent {
    async fn on_message(&self, envelope: Envelope) -> ProcessingResult {
        self.process(envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::error::ErrorCode;
    use crate::store::FsContentStore;
    use crate::traits::{MockContentStore, MockDocumentSink, SaveOutcome};
    use crate::types::PDF_CONTENT_TYPE;
    use regwatch_extractors::{
        ExtractResult, ExtractedContent, ExtractionPipeline, Extractor,
    };

    /// Treats the bytes as UTF-8 text with pages separated by form feeds.
    struct TextPagesExtractor;

    #[async_trait]
    impl Extractor for TextPagesExtractor {
        async fn extract(&self, content: &[u8]) -> ExtractResult<ExtractedContent> {
            let text = std::str::from_utf8(content).map_err(|e| {
                regwatch_extractors::ExtractError::ExtractionFailed(e.to_string())
            })?;
            Ok(ExtractedContent::from_pages(
                text.split('\u{c}').map(str::to_string).collect(),
            ))
        }

        fn supported_types(&self) -> &[&str] {
            &[PDF_CONTENT_TYPE]
        }

        fn name(&self) -> &str {
            "text-pages"
        }
    }

    fn parser() -> RegulationParser {
        RegulationParser::new(ExtractionPipeline::new().add_extractor(Arc::new(TextPagesExtractor)))
    }

    fn envelope(filename: &str, bytes: &[u8]) -> Envelope {
        Envelope::new(filename, PDF_CONTENT_TYPE, codec::encode(bytes))
    }

    #[tokio::test]
    async fn test_success_path_reaches_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsContentStore::new(dir.path()));
        let agent = IngestionAgent::new(store.clone(), parser());

        let result = agent.process(envelope("reg1.pdf", b"Intro\n\x0cBody")).await;

        assert_eq!(result.status, ProcessingStatus::Parsed);
        assert_eq!(result.filename, "reg1.pdf");
        assert_eq!(store.load("reg1.pdf").await.unwrap(), b"Intro\n\x0cBody");
    }

    #[tokio::test]
    async fn test_decode_failure_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsContentStore::new(dir.path().join("store")));
        let agent = IngestionAgent::new(store.clone(), parser());

        let result = agent
            .process(Envelope::new("bad.pdf", PDF_CONTENT_TYPE, "%%% not base64"))
            .await;

        assert!(result.is_failed());
        assert_eq!(result.error_code, Some(ErrorCode::DecInvalidEncoding));
        assert!(!store.exists("bad.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_persist_failure_is_contained() {
        let mut store = MockContentStore::new();
        store
            .expect_save()
            .returning(|_, _| Err(RegwatchError::persist("disk full")));
        store.expect_load().never();

        let agent = IngestionAgent::new(Arc::new(store), parser());
        let result = agent.process(envelope("reg1.pdf", b"Intro")).await;

        assert!(result.is_failed());
        assert_eq!(result.error_code, Some(ErrorCode::PerWriteFailed));
        assert!(result.detail.unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsContentStore::new(dir.path()));
        let agent = IngestionAgent::new(store.clone(), parser());

        let corrupt = [0xffu8, 0xfe, 0x00, 0x81];
        let result = agent.process(envelope("corrupt.pdf", &corrupt)).await;

        assert!(result.is_failed());
        assert_eq!(result.error_code, Some(ErrorCode::ParseCorruptDocument));
        assert_eq!(store.load("corrupt.pdf").await.unwrap(), corrupt);
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let agent = IngestionAgent::new(Arc::new(FsContentStore::new(dir.path())), parser());

        let result = agent
            .process(Envelope::new("a.docx", "application/docx", codec::encode(b"x")))
            .await;

        assert_eq!(result.error_code, Some(ErrorCode::ParseUnsupportedType));
    }

    #[tokio::test]
    async fn test_forwards_to_every_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = MockDocumentSink::new();
        first
            .expect_forward()
            .withf(|doc| doc.regulation_id == "reg1.pdf" && doc.title == "reg1")
            .times(1)
            .returning(|_| Ok(()));
        first.expect_name().return_const("first".to_string());
        let mut second = MockDocumentSink::new();
        second.expect_forward().times(1).returning(|_| Ok(()));
        second.expect_name().return_const("second".to_string());

        let agent = IngestionAgent::new(Arc::new(FsContentStore::new(dir.path())), parser())
            .with_sink(Arc::new(first))
            .with_sink(Arc::new(second));

        let result = agent.process(envelope("reg1.pdf", b"Intro")).await;
        assert!(result.is_parsed());
    }

    #[tokio::test]
    async fn test_sink_failure_marks_failed() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MockDocumentSink::new();
        sink.expect_forward()
            .returning(|_| Err(RegwatchError::persist("output dir read-only")));
        sink.expect_name().return_const("broken".to_string());

        let agent = IngestionAgent::new(Arc::new(FsContentStore::new(dir.path())), parser())
            .with_sink(Arc::new(sink));

        let result = agent.process(envelope("reg1.pdf", b"Intro")).await;
        assert!(result.is_failed());
    }

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let mut store = MockContentStore::new();
        store
            .expect_save()
            .times(2)
            .returning(|_, _| Ok(SaveOutcome::Unchanged));
        store
            .expect_load()
            .times(2)
            .returning(|_| Ok(b"Intro".to_vec()));

        let agent = IngestionAgent::new(Arc::new(store), parser());
        let first = agent.process(envelope("reg1.pdf", b"Intro")).await;
        let second = agent.process(envelope("reg1.pdf", b"Intro")).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_outcomes_are_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let agent = IngestionAgent::new(Arc::new(FsContentStore::new(dir.path())), parser());
        let mut events = agent.events().subscribe();

        agent.process(envelope("nested/dir/reg1.pdf", b"Intro")).await;

        let event = events.recv().await.unwrap();
        assert_eq!(event.filename, "reg1.pdf");
        assert!(event.is_parsed());
    }
}
