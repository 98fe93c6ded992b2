//! PDF content extraction using pdf-extract.

use crate::error::{ExtractError, ExtractResult};
use crate::types::ExtractedContent;
use crate::{Extractor, PDF_CONTENT_TYPE};
use async_trait::async_trait;

/// PDF content extractor using pdf-extract library.
///
/// Extracts text page by page, wrapping synchronous pdf-extract
/// calls in spawn_blocking to avoid blocking the async runtime.
/// pdf-extract can panic on malformed input; the panic surfaces
/// as a join error and is reported like any other decode failure.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create new PDF extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract page texts synchronously.
    pub fn extract_pages(content: &[u8]) -> ExtractResult<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(content)
            .map_err(|e| ExtractError::Pdf(e.to_string()))
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractResult<ExtractedContent> {
        let bytes = content.to_vec();
        let pages = tokio::task::spawn_blocking(move || Self::extract_pages(&bytes))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    ExtractError::Pdf("decoder panicked on malformed document".to_string())
                } else {
                    ExtractError::TaskJoin(e)
                }
            })??;

        let content = ExtractedContent::from_pages(pages);
        let page_count = content.structure.page_count;
        Ok(content.with_metadata("page_count", page_count))
    }

    fn supported_types(&self) -> &[&str] {
        &[PDF_CONTENT_TYPE]
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a PDF with one text-showing page per entry using lopdf.
    pub(crate) fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
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

    #[tokio::test]
    async fn test_extract_pages_in_order() {
        let pdf = make_test_pdf(&["Intro", "Body"]);
        let content = PdfExtractor::new().extract(&pdf).await.unwrap();

        assert_eq!(content.structure.page_count, 2);
        let intro = content.text.find("Intro").expect("intro text");
        let body = content.text.find("Body").expect("body text");
        assert!(intro < body);
        assert_eq!(content.metadata["page_count"], 2);
    }

    #[tokio::test]
    async fn test_invalid_pdf_returns_error() {
        let result = PdfExtractor::new().extract(b"not a pdf").await;
        assert!(matches!(result, Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn test_supports_pdf_only() {
        let extractor = PdfExtractor::new();
        assert!(extractor.supports("application/pdf"));
        assert!(!extractor.supports("text/plain"));
        assert_eq!(extractor.name(), "pdf-extract");
    }
}
