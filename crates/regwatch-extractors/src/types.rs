//! Core types for content extraction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page-level structure of an extracted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Total page count, including pages that yielded no text.
    pub page_count: usize,

    /// Text of each page that yielded text, in page order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub pages: Vec<String>,
}

/// Raw output of an [`Extractor`](crate::Extractor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Newline-joined page text.
    pub text: String,

    /// Per-page breakdown.
    pub structure: DocumentStructure,

    /// Additional metadata (format-specific).
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ExtractedContent {
    /// Build content from the texts of every page, skipping blank pages.
    pub fn from_pages(pages: Vec<String>) -> Self {
        let page_count = pages.len();
        let pages: Vec<String> = pages
            .into_iter()
            .filter(|page| !page.trim().is_empty())
            .collect();

        Self {
            text: pages.join("\n"),
            structure: DocumentStructure { page_count, pages },
            metadata: HashMap::new(),
        }
    }

    /// Add metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check if extraction produced meaningful content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Get content length.
    pub fn len(&self) -> usize {
        self.text.len()
    }
}

/// A labeled, non-blank chunk of a document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Sequential label ("Section 1", "Section 2", ...).
    #[serde(rename = "section")]
    pub label: String,
    /// Trimmed chunk text.
    pub content: String,
}

impl Section {
    /// Create the section at 1-based position `number`.
    pub fn numbered(number: usize, content: impl Into<String>) -> Self {
        Self {
            label: format!("Section {}", number),
            content: content.into(),
        }
    }
}

/// Structured representation of a regulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Identity of the regulation; always the filename.
    pub regulation_id: String,
    /// Filename without its extension.
    pub title: String,
    /// Sections in document order.
    pub sections: Vec<Section>,
    /// Full extracted text.
    pub raw_text: String,
}

impl ExtractedDocument {
    /// Serialize to the downstream JSON shape.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "regulation_id": self.regulation_id,
            "title": self.title,
            "sections": self.sections,
            "raw_text": self.raw_text,
        })
    }
}
