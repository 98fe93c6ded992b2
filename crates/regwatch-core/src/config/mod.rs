//! Configuration system for regwatch.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RegwatchError, RegwatchResult};
use crate::traits::{AckMode, LlmConfig};
use crate::types::DESTINATION;

/// LLM provider type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LlmProvider {
    OpenAI,
    #[default]
    Groq,
    Anthropic,
}

/// Broker connection and subscription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker URL.
    pub url: String,
    /// Stream holding the regulation subjects.
    pub stream: String,
    /// Destination documents are published to and consumed from.
    pub destination: String,
    /// Durable consumer shared by every monitor instance.
    pub consumer_name: String,
    pub connect_timeout_secs: u64,
    /// Time the broker waits for an ack before redelivering.
    pub ack_wait_secs: u64,
    pub ack_mode: AckMode,
    /// Delivery attempts before the broker gives up on a message.
    pub max_deliver: i64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            stream: "REGULATION".to_string(),
            destination: DESTINATION.to_string(),
            consumer_name: "regwatch-monitor".to_string(),
            connect_timeout_secs: 10,
            ack_wait_secs: 300,
            ack_mode: AckMode::Client,
            max_deliver: 5,
        }
    }
}

impl BrokerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn ack_wait(&self) -> Duration {
        Duration::from_secs(self.ack_wait_secs)
    }
}

/// Content store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one file per received document.
    pub content_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let regwatch_dir = dirs::home_dir()
            .map(|h| h.join(".regwatch"))
            .unwrap_or_else(|| PathBuf::from(".regwatch"));

        Self {
            content_dir: regwatch_dir.join("documents"),
        }
    }
}

/// Producer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Delay between consecutive sends in a batch; 0 disables pacing.
    pub pacing_secs: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self { pacing_secs: 10 }
    }
}

impl ProducerConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }
}

/// Summary agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub llm: LlmConfig,
    #[serde(default = "default_agent_timeout_secs")]
    pub timeout_secs: u64,
    /// Characters of raw text sent to the agent.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_agent_timeout_secs() -> u64 {
    60
}

fn default_max_input_chars() -> usize {
    48_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            llm: LlmConfig::default(),
            timeout_secs: default_agent_timeout_secs(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where parsed documents go besides the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Log every parsed document as JSON.
    pub log_documents: bool,
    /// Write `<filename>.json` for every parsed document here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            log_documents: true,
            output_dir: None,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub broker: BrokerConfig,
    pub store: StoreConfig,
    pub producer: ProducerConfig,
    /// Summary agent; `None` disables the dispatcher.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentConfig>,
    pub sink: SinkConfig,
}

impl PipelineConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> RegwatchResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| RegwatchError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RegwatchError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| RegwatchError::Configuration(e.to_string())),
            _ => Err(RegwatchError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> RegwatchResult<Self> {
        Self::default().with_env()
    }

    /// Override fields from environment variables.
    pub fn with_env(self) -> RegwatchResult<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Override fields from a variable lookup.
    pub fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> RegwatchResult<Self> {
        // Broker
        if let Some(url) = var("REGWATCH_NATS_URL") {
            self.broker.url = url;
        }
        if let Some(destination) = var("REGWATCH_DESTINATION") {
            self.broker.destination = destination;
        }
        if let Some(mode) = var("REGWATCH_ACK_MODE") {
            self.broker.ack_mode = mode.parse().map_err(|_| {
                RegwatchError::Configuration(format!(
                    "REGWATCH_ACK_MODE must be 'client' or 'auto', got '{}'",
                    mode
                ))
            })?;
        }

        // Store and producer
        if let Some(dir) = var("REGWATCH_CONTENT_DIR") {
            self.store.content_dir = PathBuf::from(dir);
        }
        if let Some(secs) = var("REGWATCH_PACING_SECS") {
            self.producer.pacing_secs = parse_number("REGWATCH_PACING_SECS", &secs)?;
        }

        // Agent
        if let Some(provider) = var("REGWATCH_LLM_PROVIDER") {
            let provider = provider.parse().map_err(|_| {
                RegwatchError::Configuration(format!(
                    "REGWATCH_LLM_PROVIDER must be one of openai, groq, anthropic; got '{}'",
                    provider
                ))
            })?;
            self.agent.get_or_insert_with(AgentConfig::default).provider = provider;
        }
        if let Some(model) = var("REGWATCH_LLM_MODEL") {
            self.agent.get_or_insert_with(AgentConfig::default).llm.model = model;
        }
        if let Some(secs) = var("REGWATCH_AGENT_TIMEOUT_SECS") {
            self.agent.get_or_insert_with(AgentConfig::default).timeout_secs =
                parse_number("REGWATCH_AGENT_TIMEOUT_SECS", &secs)?;
        }

        // Sinks
        if let Some(dir) = var("REGWATCH_OUTPUT_DIR") {
            self.sink.output_dir = Some(PathBuf::from(dir));
        }

        Ok(self)
    }
}

fn parse_number(key: &str, value: &str) -> RegwatchResult<u64> {
    value.trim().parse().map_err(|_| {
        RegwatchError::Configuration(format!("{} must be a whole number, got '{}'", key, value))
    })
}
