//! End-to-end pipeline tests over the in-memory broker.
//!
//! Producer -> broker -> ingestion agent -> extractor -> sinks, with real
//! PDFs generated by lopdf and a temporary content store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regwatch_core::traits::DocumentSink;
use regwatch_core::{
    codec, AckMode, ContentStore, DocumentProducer, Envelope, ErrorCode, ExtractedDocument,
    FsContentStore, InMemoryBroker, IngestionAgent, JsonFileSink, ProcessingResult,
    ProcessingStatus, QueuePublisher, QueueSubscriber, RegulationParser, RegwatchError, RegwatchResult,
    DESTINATION,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

fn make_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Collects forwarded documents.
#[derive(Default)]
struct CollectingSink(Mutex<Vec<ExtractedDocument>>);

#[async_trait]
impl DocumentSink for CollectingSink {
    async fn forward(&self, document: &ExtractedDocument) -> RegwatchResult<()> {
        self.0.lock().await.push(document.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "collect"
    }
}

struct Harness {
    broker: InMemoryBroker,
    store: Arc<FsContentStore>,
    sink: Arc<CollectingSink>,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            broker: InMemoryBroker::new(),
            store: Arc::new(FsContentStore::new(dir.path().join("mock_folder"))),
            sink: Arc::new(CollectingSink::default()),
            _dir: dir,
        }
    }

    fn producer(&self) -> DocumentProducer {
        DocumentProducer::new(Arc::new(self.broker.clone()))
    }

    /// Run the agent until `expected` results arrive, then stop it.
    async fn consume(&self, expected: usize) -> Vec<ProcessingResult> {
        let agent = IngestionAgent::new(self.store.clone(), RegulationParser::default())
            .with_sink(self.sink.clone());
        let mut events = agent.events().subscribe();
        let shutdown = CancellationToken::new();

        let task = {
            let broker = self.broker.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                broker
                    .subscribe(DESTINATION, AckMode::Client, Arc::new(agent), shutdown)
                    .await
            })
        };

        let mut results = Vec::new();
        while results.len() < expected {
            let result = tokio::time::timeout(Duration::from_secs(30), events.recv())
                .await
                .expect("result within timeout")
                .expect("event bus open");
            results.push(result);
        }

        shutdown.cancel();
        task.await.unwrap().unwrap();
        results
    }
}

#[tokio::test]
async fn test_scenario_a_two_page_document() {
    let harness = Harness::new();
    let pdf = make_pdf(&["Intro", "Body"]);

    harness.producer().publish("reg1.pdf", &pdf).await.unwrap();
    let results = harness.consume(1).await;

    assert_eq!(results[0].filename, "reg1.pdf");
    assert_eq!(results[0].status, ProcessingStatus::Parsed);
    assert_eq!(harness.store.load("reg1.pdf").await.unwrap(), pdf);

    let docs = harness.sink.0.lock().await;
    let doc = &docs[0];
    assert_eq!(doc.regulation_id, "reg1.pdf");
    assert_eq!(doc.title, "reg1");
    let intro = doc.raw_text.find("Intro").expect("intro in raw text");
    let body = doc.raw_text.find("Body").expect("body in raw text");
    assert!(intro < body);

    for (i, section) in doc.sections.iter().enumerate() {
        assert_eq!(section.label, format!("Section {}", i + 1));
        assert!(!section.content.trim().is_empty());
    }
    let joined: Vec<&str> = doc.sections.iter().map(|s| s.content.as_str()).collect();
    let joined = joined.join("\n\n");
    assert!(joined.find("Intro").unwrap() < joined.find("Body").unwrap());
}

#[tokio::test]
async fn test_scenario_b_broker_unreachable() {
    let harness = Harness::new();
    harness.broker.set_online(false);

    let err = harness
        .producer()
        .publish("reg1.pdf", &make_pdf(&["Intro"]))
        .await
        .unwrap_err();

    assert!(matches!(err, RegwatchError::Connection { .. }));
    harness.broker.set_online(true);
    assert!(harness.broker.is_empty(DESTINATION).await);
}

#[tokio::test]
async fn test_scenario_c_order_preserved_and_failures_isolated() {
    let harness = Harness::new();
    let producer = harness.producer();

    producer.publish("a.pdf", b"%PDF-1.4 truncated").await.unwrap();
    producer
        .publish("b.pdf", &make_pdf(&["Second document"]))
        .await
        .unwrap();

    let results = harness.consume(2).await;

    assert_eq!(results[0].filename, "a.pdf");
    assert_eq!(results[0].status, ProcessingStatus::Failed);
    assert_eq!(results[0].error_code, Some(ErrorCode::ParseCorruptDocument));
    assert_eq!(results[1].filename, "b.pdf");
    assert_eq!(results[1].status, ProcessingStatus::Parsed);

    let docs = harness.sink.0.lock().await;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].regulation_id, "b.pdf");
}

#[tokio::test]
async fn test_scenario_d_corrupt_document_kept() {
    let harness = Harness::new();
    let corrupt = b"this is not a pdf at all".to_vec();

    harness.producer().publish("broken.pdf", &corrupt).await.unwrap();
    let results = harness.consume(1).await;

    assert!(results[0].is_failed());
    assert_eq!(results[0].error_code, Some(ErrorCode::ParseCorruptDocument));
    assert!(harness.store.exists("broken.pdf").await.unwrap());
    assert_eq!(harness.store.load("broken.pdf").await.unwrap(), corrupt);
}

#[tokio::test]
async fn test_undecodable_body_is_skipped() {
    let harness = Harness::new();
    harness
        .broker
        .publish(
            DESTINATION,
            &Envelope::new("bad.pdf", "application/pdf", "***"),
        )
        .await
        .unwrap();
    harness.producer().publish("good.pdf", &make_pdf(&["Ok"])).await.unwrap();

    let results = harness.consume(2).await;

    assert_eq!(results[0].error_code, Some(ErrorCode::DecInvalidEncoding));
    assert!(!harness.store.exists("bad.pdf").await.unwrap());
    assert!(results[1].is_parsed());
}

#[tokio::test]
async fn test_duplicate_delivery_is_idempotent() {
    let harness = Harness::new();
    let pdf = make_pdf(&["Intro"]);
    let producer = harness.producer();

    producer.publish("reg1.pdf", &pdf).await.unwrap();
    producer.publish("reg1.pdf", &pdf).await.unwrap();
    let results = harness.consume(2).await;

    assert_eq!(results[0], results[1]);
    assert_eq!(harness.store.load("reg1.pdf").await.unwrap(), pdf);
}

#[tokio::test]
async fn test_json_file_sink_receives_parsed_document() {
    let harness = Harness::new();
    let out = tempfile::tempdir().unwrap();
    let agent = IngestionAgent::new(harness.store.clone(), RegulationParser::default())
        .with_sink(Arc::new(JsonFileSink::new(out.path())));

    let envelope = Envelope::new(
        "reg9.pdf",
        "application/pdf",
        codec::encode(&make_pdf(&["Scope"])),
    );
    let result = agent.process(envelope).await;

    assert!(result.is_parsed());
    let written = std::fs::read(out.path().join("reg9.pdf.json")).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&written).unwrap();
    assert_eq!(value["regulation_id"], "reg9.pdf");
    assert_eq!(value["title"], "reg9");
}
