//! OpenAI-compatible chat provider (OpenAI and Groq).

use async_trait::async_trait;

use regwatch_core::error::{RegwatchError, RegwatchResult};
use regwatch_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};
use regwatch_core::types::{Message, MessageRole};

#[cfg(feature = "openai")]
use regwatch_core::traits::TokenUsage;

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, ResponseFormat as OpenAIResponseFormat,
    },
    Client,
};

/// Default OpenAI model.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4.1-nano-2025-04-14";

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default Groq model.
pub const GROQ_DEFAULT_MODEL: &str = "openai/gpt-oss-120b";

/// OpenAI-compatible LLM provider.
pub struct OpenAIProvider {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: LlmConfig,
    label: &'static str,
}

impl OpenAIProvider {
    /// Create a provider against the OpenAI API.
    pub fn new(config: LlmConfig) -> RegwatchResult<Self> {
        Self::build(config, "OpenAI", "OPENAI_API_KEY", None, OPENAI_DEFAULT_MODEL)
    }

    /// Create a provider against Groq's OpenAI-compatible API.
    pub fn groq(config: LlmConfig) -> RegwatchResult<Self> {
        Self::build(
            config,
            "Groq",
            "GROQ_API_KEY",
            Some(GROQ_API_BASE),
            GROQ_DEFAULT_MODEL,
        )
    }

    fn build(
        mut config: LlmConfig,
        label: &'static str,
        key_var: &str,
        default_base: Option<&str>,
        default_model: &str,
    ) -> RegwatchResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(key_var).ok())
            .ok_or_else(|| {
                RegwatchError::Configuration(format!(
                    "{} API key not found. Set {} environment variable or provide api_key in config.",
                    label, key_var
                ))
            })?;

        if config.base_url.is_none() {
            config.base_url = default_base.map(str::to_string);
        }
        if config.model.is_empty() {
            config.model = default_model.to_string();
        }

        #[cfg(feature = "openai")]
        let client = {
            let openai_config = OpenAIConfig::new().with_api_key(api_key);
            let openai_config = match config.base_url.as_deref() {
                Some(base_url) => openai_config.with_api_base(base_url),
                None => openai_config,
            };
            Client::with_config(openai_config)
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
            label,
        })
    }

    /// API base in use, if not the OpenAI default.
    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    /// Check if this is a reasoning model that doesn't support sampling params.
    fn is_reasoning_model(&self) -> bool {
        let model = self.config.model.to_lowercase();
        let name = model.rsplit('/').next().unwrap_or(&model);
        ["o1", "o3", "o4", "gpt-5"]
            .iter()
            .any(|prefix| name.starts_with(prefix))
    }

    #[cfg(feature = "openai")]
    fn message_to_openai(msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            MessageRole::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: async_openai::types::ChatCompletionRequestSystemMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            MessageRole::User => {
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: async_openai::types::ChatCompletionRequestUserMessageContent::Text(
                        msg.content.clone(),
                    ),
                    name: None,
                })
            }
            MessageRole::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(
                        async_openai::types::ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        ),
                    ),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl Llm for OpenAIProvider {
    #[cfg(feature = "openai")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> RegwatchResult<LlmResponse> {
        let options = options.unwrap_or_default();

        let mut request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Self::message_to_openai).collect(),
            ..Default::default()
        };

        if !self.is_reasoning_model() {
            request.temperature = Some(options.temperature.unwrap_or(self.config.temperature));
            request.max_completion_tokens = Some(options.max_tokens.unwrap_or(self.config.max_tokens));
        }
        if options.response_format == Some(ResponseFormat::Json) {
            request.response_format = Some(OpenAIResponseFormat::JsonObject);
        }

        tracing::debug!(provider = self.label, model = %self.config.model, "Sending chat completion");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| RegwatchError::agent(format!("{} API error: {}", self.label, e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| RegwatchError::agent("No response choices returned"))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse {
            content: choice.message.content.clone(),
            usage,
        })
    }

    #[cfg(not(feature = "openai"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> RegwatchResult<LlmResponse> {
        Err(RegwatchError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn supports_json_mode(&self) -> bool {
        true
    }
}
