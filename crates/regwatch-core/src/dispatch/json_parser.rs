//! JSON parsing utilities for LLM responses.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid regex"));

static FENCED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[a-zA-Z0-9]*\n?([\s\S]*?)\n?```$").expect("valid regex"));

static THINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

/// Extract JSON from potentially wrapped response (code blocks, etc.).
pub fn extract_json(text: &str) -> String {
    let text = text.trim();

    if let Some(content) = CODE_BLOCK_RE.captures(text).and_then(|c| c.get(1)) {
        return content.as_str().trim().to_string();
    }

    text.to_string()
}

/// Remove code fences and thinking tags from a response.
pub fn remove_code_blocks(content: &str) -> String {
    let content = content.trim();

    let content = FENCED_RE
        .captures(content)
        .and_then(|c| c.get(1).map(|m| m.as_str().trim()))
        .unwrap_or(content);

    THINK_RE.replace_all(content, "").trim().to_string()
}

/// Normalized reply from the summary agent.
///
/// The `kind` discriminator makes the branch explicit to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AgentResponse {
    /// The agent returned a JSON object.
    JsonObject(Map<String, Value>),
    /// The agent returned a JSON string.
    PlainText(String),
    /// The reply was not a JSON object or string.
    ParseFailure { raw: String, error: String },
    /// No usable reply: provider error, timeout, or empty content.
    Unavailable { error: String },
}

impl AgentResponse {
    /// Discriminator as it appears in serialized output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JsonObject(_) => "json_object",
            Self::PlainText(_) => "plain_text",
            Self::ParseFailure { .. } => "parse_failure",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }

    /// Downstream JSON shape; text replies are wrapped as `{"response": ...}`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::JsonObject(map) => Value::Object(map.clone()),
            Self::PlainText(text) => serde_json::json!({ "response": text }),
            Self::ParseFailure { raw, .. } => serde_json::json!({ "response": raw }),
            Self::Unavailable { error } => serde_json::json!({ "error": error }),
        }
    }
}

/// Normalize raw agent text into an [`AgentResponse`].
///
/// Empty text after cleanup is reported as unavailable.
pub fn normalize(raw: &str) -> AgentResponse {
    let cleaned = remove_code_blocks(raw);
    if cleaned.is_empty() {
        return AgentResponse::Unavailable {
            error: "agent returned empty content".to_string(),
        };
    }

    let json_str = extract_json(&cleaned);
    match serde_json::from_str::<Value>(&json_str) {
        Ok(Value::Object(map)) => AgentResponse::JsonObject(map),
        Ok(Value::String(text)) => AgentResponse::PlainText(text),
        Ok(other) => AgentResponse::ParseFailure {
            raw: raw.to_string(),
            error: format!("expected a JSON object, got {}", json_kind(&other)),
        },
        Err(e) => AgentResponse::ParseFailure {
            raw: raw.to_string(),
            error: e.to_string(),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
