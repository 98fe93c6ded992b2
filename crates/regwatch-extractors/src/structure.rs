//! Sectioning of extracted text into a structured regulation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractResult;
use crate::pipeline::ExtractionPipeline;
use crate::types::{ExtractedContent, ExtractedDocument, Section};

/// A blank line: newline, optional horizontal whitespace, newline.
static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n[ \t\r\f\v]*\n").expect("valid blank-line pattern"));

/// Split text on blank lines into trimmed, non-empty, numbered sections.
pub fn split_sections(text: &str) -> Vec<Section> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .enumerate()
        .map(|(i, chunk)| Section::numbered(i + 1, chunk))
        .collect()
}

/// Strip the file-type extension from a filename.
///
/// Only the last extension is removed; dotfiles and names without an
/// extension are returned unchanged.
pub fn title_from_filename(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

/// Builds [`ExtractedDocument`]s from document bytes.
#[derive(Clone, Default)]
pub struct RegulationParser {
    pipeline: ExtractionPipeline,
}

impl RegulationParser {
    /// Create a parser backed by the given pipeline.
    pub fn new(pipeline: ExtractionPipeline) -> Self {
        Self { pipeline }
    }

    /// Extract and section a document.
    ///
    /// Fails without a partial result when the bytes cannot be decoded.
    pub async fn parse(
        &self,
        filename: &str,
        content: &[u8],
        content_type: &str,
    ) -> ExtractResult<ExtractedDocument> {
        let extracted = self.pipeline.extract(content, content_type).await?;
        Ok(Self::structure(filename, extracted))
    }

    /// Turn extractor output into the structured document.
    pub fn structure(filename: &str, content: ExtractedContent) -> ExtractedDocument {
        if content.is_empty() {
            tracing::warn!(
                filename,
                page_count = content.structure.page_count,
                "No extractable text found in document"
            );
        }

        ExtractedDocument {
            regulation_id: filename.to_string(),
            title: title_from_filename(filename),
            sections: split_sections(&content.text),
            raw_text: content.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_split_on_blank_lines() {
        let sections = split_sections("Intro\n\nBody");
        assert_eq!(
            sections,
            vec![Section::numbered(1, "Intro"), Section::numbered(2, "Body")]
        );
        assert_eq!(sections[1].label, "Section 2");
    }

    #[test]
    fn test_single_newline_does_not_split() {
        let sections = split_sections("Intro\nBody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "Intro\nBody");
    }

    #[test]
    fn test_blank_chunks_discarded_and_numbering_stays_dense() {
        let sections = split_sections("\n\n  A  \n\n\n\n \n\nB\r\n\r\nC\n \t\n");
        let contents: Vec<&str> = sections.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["A", "B", "C"]);
        let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Section 1", "Section 2", "Section 3"]);
    }

    #[test]
    fn test_empty_text_has_no_sections() {
        assert!(split_sections("").is_empty());
        assert!(split_sections(" \n\n \n").is_empty());
    }

    #[test]
    fn test_sections_reconstruct_raw_text() {
        let raw = "Article 1\nScope\n\n  Article 2\n\n\nDefinitions \n \nArticle 3";
        let sections = split_sections(raw);

        assert!(sections.iter().all(|s| !s.content.trim().is_empty()));
        let joined = sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(normalize(&joined), normalize(raw));
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("reg1.pdf"), "reg1");
        assert_eq!(title_from_filename("EU-2024.1689.pdf"), "EU-2024.1689");
        assert_eq!(title_from_filename("README"), "README");
        assert_eq!(title_from_filename(".pdf"), ".pdf");
        assert_eq!(title_from_filename("trailing."), "trailing.");
    }

    #[test]
    fn test_structure_identity() {
        let content = ExtractedContent::from_pages(vec!["Intro".into(), "Body".into()]);
        let doc = RegulationParser::structure("reg1.pdf", content);

        assert_eq!(doc.regulation_id, "reg1.pdf");
        assert_eq!(doc.title, "reg1");
        assert_eq!(doc.raw_text, "Intro\nBody");
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn test_structure_with_blank_line_between_pages() {
        let content = ExtractedContent::from_pages(vec!["Intro\n".into(), "Body".into()]);
        let doc = RegulationParser::structure("reg1.pdf", content);

        assert_eq!(
            doc.sections,
            vec![Section::numbered(1, "Intro"), Section::numbered(2, "Body")]
        );
    }

    #[cfg(feature = "pdf")]
    #[tokio::test]
    async fn test_parse_pdf_end_to_end() {
        let pdf = crate::pdf::tests::make_test_pdf(&["Intro", "Body"]);
        let parser = RegulationParser::new(ExtractionPipeline::with_defaults());
        let doc = parser.parse("reg1.pdf", &pdf, "application/pdf").await.unwrap();

        assert_eq!(doc.regulation_id, "reg1.pdf");
        assert_eq!(doc.title, "reg1");
        assert!(doc.raw_text.contains("Intro"));
        assert!(doc.raw_text.contains("Body"));
        assert!(!doc.sections.is_empty());
    }

    #[tokio::test]
    async fn test_parse_unsupported_type_fails() {
        let parser = RegulationParser::new(ExtractionPipeline::with_defaults());
        let result = parser.parse("notes.txt", b"text", "text/plain").await;
        assert!(result.is_err());
    }
}
