//! Factory for creating LLM providers.

use std::sync::Arc;

use regwatch_core::config::{AgentConfig, LlmProvider};
use regwatch_core::error::RegwatchResult;
use regwatch_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::openai::OpenAIProvider;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> RegwatchResult<Arc<dyn Llm>> {
        match provider {
            LlmProvider::OpenAI => {
                let llm = OpenAIProvider::new(config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::Groq => {
                let llm = OpenAIProvider::groq(config)?;
                Ok(Arc::new(llm))
            }
            LlmProvider::Anthropic => {
                let llm = AnthropicLlm::new(config)?;
                Ok(Arc::new(llm))
            }
        }
    }

    /// Create the provider named by an agent configuration.
    pub fn from_agent_config(config: &AgentConfig) -> RegwatchResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.llm.clone())
    }

    /// Create a Groq LLM provider with default configuration.
    pub fn groq() -> RegwatchResult<Arc<dyn Llm>> {
        Self::create(LlmProvider::Groq, LlmConfig::default())
    }

    /// Create an OpenAI LLM provider with a specific model.
    pub fn openai_with_model(model: impl Into<String>) -> RegwatchResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::OpenAI, config)
    }

    /// Create an Anthropic LLM provider with a specific model.
    pub fn anthropic_with_model(model: impl Into<String>) -> RegwatchResult<Arc<dyn Llm>> {
        let config = LlmConfig {
            model: model.into(),
            ..Default::default()
        };
        Self::create(LlmProvider::Anthropic, config)
    }
}
