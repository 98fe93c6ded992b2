//! Per-message processing outcome.

use serde::Serialize;

use crate::error::{ErrorCode, RegwatchError};

/// Stage a message has reached.
///
/// The success path is `Pending -> Decoded -> Saved -> Parsed`; any stage may
/// jump to `Failed`. `Parsed` and `Failed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Decoded,
    Saved,
    Parsed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Parsed | Self::Failed)
    }
}

/// Outcome of processing one delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    /// Filename the message was processed under.
    pub filename: String,
    pub status: ProcessingStatus,
    /// Error description when `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Error code when `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl ProcessingResult {
    /// Start tracking a freshly received message.
    pub fn pending(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            status: ProcessingStatus::Pending,
            detail: None,
            error_code: None,
        }
    }

    /// Advance to the next non-terminal or successful stage.
    ///
    /// Terminal results are never moved again.
    pub fn advance(&mut self, status: ProcessingStatus) {
        if self.status.is_terminal() {
            tracing::warn!(
                filename = %self.filename,
                from = %self.status,
                to = %status,
                "Ignoring transition out of terminal state"
            );
            return;
        }
        self.status = status;
    }

    /// Mark the message failed with the given error.
    pub fn fail(&mut self, err: &RegwatchError) {
        if self.status.is_terminal() {
            return;
        }
        self.status = ProcessingStatus::Failed;
        self.detail = Some(err.to_string());
        self.error_code = Some(err.code());
    }

    /// Consume and return the failed result.
    pub fn failed(mut self, err: &RegwatchError) -> Self {
        self.fail(err);
        self
    }

    pub fn is_parsed(&self) -> bool {
        self.status == ProcessingStatus::Parsed
    }

    pub fn is_failed(&self) -> bool {
        self.status == ProcessingStatus::Failed
    }
}
