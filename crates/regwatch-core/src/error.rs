//! Error types for regwatch operations.
//!
//! Every pipeline failure maps to one variant with a structured error code.
//! Connection errors are the only kind that propagate out of the producer
//! and the subscription loop; the per-message kinds are captured in a
//! [`ProcessingResult`](crate::types::ProcessingResult) instead.

use thiserror::Error;

/// Result type alias for regwatch operations.
pub type RegwatchResult<T> = Result<T, RegwatchError>;

/// Main error type for all regwatch operations.
#[derive(Error, Debug)]
pub enum RegwatchError {
    /// Broker connection could not be established, or a publish failed.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Envelope body is not valid encoded text.
    #[error("Decode error: {message}")]
    Decode { message: String, code: ErrorCode },

    /// Content store read or write failed.
    #[error("Persist error: {message}")]
    Persist {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Document could not be extracted.
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// External analysis agent failed.
    #[error("Agent error: {message}")]
    Agent { message: String, code: ErrorCode },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Connection (CONN_xxx)
    ConnFailed,
    ConnPublishFailed,
    ConnSubscribeFailed,

    // Decode (DEC_xxx)
    DecInvalidEncoding,

    // Persist (PER_xxx)
    PerWriteFailed,
    PerReadFailed,
    PerInvalidKey,

    // Parse (PARSE_xxx)
    ParseCorruptDocument,
    ParseUnsupportedType,

    // Agent (AGENT_xxx)
    AgentUnavailable,
    AgentTimeout,
    AgentInvalidResponse,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnFailed => "CONN_001",
            ErrorCode::ConnPublishFailed => "CONN_002",
            ErrorCode::ConnSubscribeFailed => "CONN_003",
            ErrorCode::DecInvalidEncoding => "DEC_001",
            ErrorCode::PerWriteFailed => "PER_001",
            ErrorCode::PerReadFailed => "PER_002",
            ErrorCode::PerInvalidKey => "PER_003",
            ErrorCode::ParseCorruptDocument => "PARSE_001",
            ErrorCode::ParseUnsupportedType => "PARSE_002",
            ErrorCode::AgentUnavailable => "AGENT_001",
            ErrorCode::AgentTimeout => "AGENT_002",
            ErrorCode::AgentInvalidResponse => "AGENT_003",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl RegwatchError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnFailed,
            source: None,
        }
    }

    /// Create a connection error for a failed publish.
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnPublishFailed,
            source: None,
        }
    }

    /// Create a connection error for a failed subscription.
    pub fn subscribe(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            code: ErrorCode::ConnSubscribeFailed,
            source: None,
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            code: ErrorCode::DecInvalidEncoding,
        }
    }

    /// Create a persist error.
    pub fn persist(message: impl Into<String>) -> Self {
        Self::Persist {
            message: message.into(),
            code: ErrorCode::PerWriteFailed,
            source: None,
        }
    }

    /// Create a persist error wrapping an IO failure.
    pub fn persist_io(message: impl Into<String>, code: ErrorCode, err: std::io::Error) -> Self {
        Self::Persist {
            message: format!("{}: {}", message.into(), err),
            code,
            source: Some(Box::new(err)),
        }
    }

    /// Create a persist error for a filename that cannot be used as a key.
    pub fn invalid_key(filename: &str) -> Self {
        Self::Persist {
            message: format!("'{}' is not a usable document filename", filename),
            code: ErrorCode::PerInvalidKey,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseCorruptDocument,
            source: None,
        }
    }

    /// Create an agent error.
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent {
            message: message.into(),
            code: ErrorCode::AgentUnavailable,
        }
    }

    /// Create an agent timeout error.
    pub fn agent_timeout(after: std::time::Duration) -> Self {
        Self::Agent {
            message: format!("no response within {:?}", after),
            code: ErrorCode::AgentTimeout,
        }
    }

    /// Attach the underlying cause. Variants without a source slot are unchanged.
    pub fn with_source(mut self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        match &mut self {
            Self::Connection { source, .. }
            | Self::Persist { source, .. }
            | Self::Parse { source, .. } => *source = Some(Box::new(err)),
            _ => {}
        }
        self
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Connection { code, .. } => *code,
            Self::Decode { code, .. } => *code,
            Self::Persist { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Agent { code, .. } => *code,
            Self::Io(_) => ErrorCode::PerWriteFailed,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error is fatal to the invoking call rather than to one message.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { .. } => Some("Check that the broker is running and the URL is correct"),
            Self::Decode { .. } => Some("Republish the document; the message body was not valid base64"),
            Self::Persist { .. } => Some("Check permissions and free space in the content directory"),
            Self::Parse { .. } => Some("The raw document is kept in the content store for manual reprocessing"),
            Self::Agent { .. } => Some("Please check your LLM provider configuration"),
            _ => None,
        }
    }
}

impl From<regwatch_extractors::ExtractError> for RegwatchError {
    fn from(err: regwatch_extractors::ExtractError) -> Self {
        let code = match err {
            regwatch_extractors::ExtractError::UnsupportedType(_) => {
                ErrorCode::ParseUnsupportedType
            }
            _ => ErrorCode::ParseCorruptDocument,
        };
        Self::Parse {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error() {
        let err = RegwatchError::connection("broker unreachable");
        assert_eq!(err.code(), ErrorCode::ConnFailed);
        assert!(err.is_connection());
        assert!(err.suggestion().is_some());
        assert!(err.to_string().contains("broker unreachable"));
    }

    #[test]
    fn test_extract_error_maps_to_parse() {
        let err: RegwatchError =
            regwatch_extractors::ExtractError::UnsupportedType("text/plain".into()).into();
        assert_eq!(err.code(), ErrorCode::ParseUnsupportedType);
        assert!(!err.is_connection());

        let err: RegwatchError =
            regwatch_extractors::ExtractError::ExtractionFailed("bad xref".into()).into();
        assert_eq!(err.code(), ErrorCode::ParseCorruptDocument);
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::ConnFailed.as_str(), "CONN_001");
        assert_eq!(ErrorCode::DecInvalidEncoding.as_str(), "DEC_001");
        assert_eq!(ErrorCode::ParseCorruptDocument.to_string(), "PARSE_001");
    }
}
