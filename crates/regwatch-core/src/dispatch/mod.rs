//! Optional summary step: hand a parsed regulation to an LLM agent.
//!
//! The dispatcher never fails the pipeline. Provider errors, timeouts and
//! empty replies all become [`AgentResponse::Unavailable`].

mod json_parser;

pub use json_parser::{extract_json, normalize, remove_code_blocks, AgentResponse};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regwatch_extractors::ExtractedDocument;
use tracing::{debug, info, warn};

use crate::error::{RegwatchError, RegwatchResult};
use crate::traits::{DocumentSink, GenerationOptions, Llm, ResponseFormat};
use crate::types::Message;

/// Default time allowed for one agent call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of `raw_text` characters sent to the agent.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 48_000;

const MONITOR_INSTRUCTIONS: &str = "You monitor newly published financial and \
regulatory documents. You receive one regulation as JSON with the fields \
regulation_id, title, sections and raw_text. Reply with a single JSON object \
that repeats regulation_id, title, sections and raw_text and adds a \
`summary` field: a short plain language account of what the regulation requires, who it applies to, and any \
dates or thresholds it sets. Do not wrap the JSON in markdown.";

/// Sends parsed documents to an LLM and normalizes the reply.
pub struct SummaryDispatcher {
    llm: Arc<dyn Llm>,
    timeout: Duration,
    max_input_chars: usize,
    temperature: f32,
}

impl SummaryDispatcher {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            timeout: DEFAULT_TIMEOUT,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            temperature: 0.2,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Build the conversation sent to the agent.
    pub fn build_messages(&self, document: &ExtractedDocument) -> RegwatchResult<Vec<Message>> {
        let mut payload = document.clone();
        if let Some(truncated) = truncate_chars(&payload.raw_text, self.max_input_chars) {
            debug!(
                regulation_id = %document.regulation_id,
                limit = self.max_input_chars,
                "Truncated raw text for agent input"
            );
            payload.raw_text = truncated;
        }

        Ok(vec![
            Message::system(MONITOR_INSTRUCTIONS),
            Message::user(serde_json::to_string(&payload.to_json())?),
        ])
    }

    /// Ask the agent for a summary of one document.
    pub async fn dispatch(&self, document: &ExtractedDocument) -> AgentResponse {
        match self.call(document).await {
            Ok(raw) => {
                let mut response = normalize(&raw);
                match &mut response {
                    AgentResponse::JsonObject(map) => merge_document_fields(map, document),
                    AgentResponse::ParseFailure { error, .. } => warn!(
                        regulation_id = %document.regulation_id,
                        error = %error,
                        "Agent reply was not a JSON object, wrapping raw text"
                    ),
                    AgentResponse::Unavailable { error } => warn!(
                        regulation_id = %document.regulation_id,
                        error = %error,
                        "Agent returned no usable content"
                    ),
                    _ => {}
                }
                response
            }
            Err(e) => {
                warn!(
                    regulation_id = %document.regulation_id,
                    model = self.llm.model_name(),
                    error = %e,
                    code = %e.code(),
                    "Summary agent unavailable"
                );
                AgentResponse::Unavailable {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn call(&self, document: &ExtractedDocument) -> RegwatchResult<String> {
        let messages = self.build_messages(document)?;
        let options = GenerationOptions {
            temperature: Some(self.temperature),
            max_tokens: None,
            response_format: self
                .llm
                .supports_json_mode()
                .then_some(ResponseFormat::Json),
        };

        let response = tokio::time::timeout(self.timeout, self.llm.generate(&messages, Some(options)))
            .await
            .map_err(|_| RegwatchError::agent_timeout(self.timeout))??;

        Ok(response.content.unwrap_or_default())
    }
}

/// Fill in the document fields the agent left out of its reply.
fn merge_document_fields(
    map: &mut serde_json::Map<String, serde_json::Value>,
    document: &ExtractedDocument,
) {
    if let serde_json::Value::Object(fields) = document.to_json() {
        for (key, value) in fields {
            map.entry(key).or_insert(value);
        }
    }
}

#[async_trait]
impl DocumentSink for SummaryDispatcher {
    async fn forward(&self, document: &ExtractedDocument) -> RegwatchResult<()> {
        let response = self.dispatch(document).await;
        if response.is_available() {
            let rendered = serde_json::to_string_pretty(&response.to_value())?;
            info!(
                regulation_id = %document.regulation_id,
                kind = response.kind(),
                "Agent response:\n{}",
                rendered
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "summary"
    }
}

/// Cut `text` to at most `max_chars` characters, or `None` if it already fits.
fn truncate_chars(text: &str, max_chars: usize) -> Option<String> {
    text.char_indices()
        .nth(max_chars)
        .map(|(idx, _)| text[..idx].to_string())
}
