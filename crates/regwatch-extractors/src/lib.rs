//! regwatch-extractors - Text extraction for regulatory documents.
//!
//! Turns raw document bytes into per-page text and then into a sectioned
//! [`ExtractedDocument`] keyed by the document's filename.
//!
//! # Features
//!
//! - `pdf` (default) - PDF text extraction via pdf-extract
//!
//! # Example
//!
//! ```ignore
//! use regwatch_extractors::{ExtractionPipeline, RegulationParser};
//!
//! // Route by MIME type and build the sectioned document
//! let parser = RegulationParser::new(ExtractionPipeline::with_defaults());
//! let document = parser.parse("reg1.pdf", &pdf_bytes, "application/pdf").await?;
//!
//! for section in &document.sections {
//!     println!("{}: {}", section.label, section.content);
//! }
//! ```

mod error;
mod factory;
mod pipeline;
mod structure;
mod types;

#[cfg(feature = "pdf")]
mod pdf;

pub use error::{ExtractError, ExtractResult};
pub use factory::ExtractorFactory;
pub use pipeline::ExtractionPipeline;
pub use structure::{split_sections, title_from_filename, RegulationParser};
pub use types::{DocumentStructure, ExtractedContent, ExtractedDocument, Section};

#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

use async_trait::async_trait;

/// MIME type carried by every regulation envelope.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Core Extractor trait - all content extractors implement this.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract per-page text from document bytes.
    async fn extract(&self, content: &[u8]) -> ExtractResult<ExtractedContent>;

    /// Supported MIME types for this extractor.
    fn supported_types(&self) -> &[&str];

    /// Check if this extractor handles the given MIME type.
    fn supports(&self, mime_type: &str) -> bool {
        self.supported_types().contains(&mime_type)
    }

    /// Human-readable name for this extractor.
    fn name(&self) -> &str;
}
