//! Documents and the envelopes that carry them through the queue.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{RegwatchError, RegwatchResult};

pub use regwatch_extractors::PDF_CONTENT_TYPE;

/// Queue that carries incoming regulations.
pub const DESTINATION: &str = "regulation.incoming";

/// Header naming the document.
pub const HEADER_FILENAME: &str = "filename";

/// Header carrying the document MIME type.
pub const HEADER_CONTENT_TYPE: &str = "contentType";

/// Filename used when a delivered message has no filename header.
pub const FALLBACK_FILENAME: &str = "unknown.pdf";

/// Reduce a path-like name to its final component.
///
/// Both `/` and `\` count as separators so names produced on any platform
/// cannot escape the content directory.
pub fn base_filename(raw: &str) -> &str {
    raw.rsplit(&['/', '\\'][..]).next().unwrap_or(raw)
}

/// A regulatory document as read by the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identity key within a processing batch.
    pub filename: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// When the producer picked the document up.
    pub arrival_time: DateTime<Utc>,
}

impl Document {
    /// Create a PDF document arriving now.
    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            content_type: PDF_CONTENT_TYPE.to_string(),
            arrival_time: Utc::now(),
        }
    }

    /// Read a PDF from disk, keyed by its base filename.
    pub async fn from_path(path: impl AsRef<Path>) -> RegwatchResult<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                RegwatchError::Configuration(format!("'{}' has no usable filename", path.display()))
            })?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::pdf(filename, bytes))
    }
}

/// Required envelope headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeHeaders {
    pub filename: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// The wire unit carried by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub headers: EnvelopeHeaders,
    /// Codec-encoded document bytes.
    pub body: String,
}

impl Envelope {
    /// Create an envelope from already-encoded parts.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            headers: EnvelopeHeaders {
                filename: filename.into(),
                content_type: content_type.into(),
            },
            body: body.into(),
        }
    }

    /// Encode a document into an envelope.
    pub fn encode(document: &Document) -> Self {
        Self::new(
            document.filename.clone(),
            document.content_type.clone(),
            codec::encode(&document.bytes),
        )
    }

    /// Rebuild an envelope from delivered headers, filling in missing ones.
    pub fn from_headers(headers: &HashMap<String, String>, body: impl Into<String>) -> Self {
        let filename = match headers.get(HEADER_FILENAME) {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => {
                tracing::warn!(
                    fallback = FALLBACK_FILENAME,
                    "Delivered message has no filename header"
                );
                FALLBACK_FILENAME.to_string()
            }
        };
        let content_type = headers
            .get(HEADER_CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| PDF_CONTENT_TYPE.to_string());

        Self::new(filename, content_type, body)
    }

    /// Header key/value pairs in wire order.
    pub fn header_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (HEADER_FILENAME, self.headers.filename.as_str()),
            (HEADER_CONTENT_TYPE, self.headers.content_type.as_str()),
        ]
    }

    /// Decode the body back into document bytes.
    pub fn decode_body(&self) -> RegwatchResult<Vec<u8>> {
        codec::decode(&self.body)
    }

    pub fn filename(&self) -> &str {
        &self.headers.filename
    }

    pub fn content_type(&self) -> &str {
        &self.headers.content_type
    }
}
