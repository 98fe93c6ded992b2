//! regwatch-llm - LLM provider implementations for regwatch.
//!
//! These back the summary dispatcher in `regwatch-core`.
//!
//! # Supported Providers
//!
//! - **Groq** (feature: `openai`) - OpenAI-compatible endpoint, `openai/gpt-oss-120b` by default
//! - **OpenAI** (feature: `openai`) - GPT-4.1, GPT-4o, etc.
//! - **Anthropic** - Claude via the Messages API
//!
//! # Example
//!
//! ```ignore
//! use regwatch_llm::LlmFactory;
//!
//! // Groq with GROQ_API_KEY from the environment
//! let llm = LlmFactory::groq()?;
//!
//! // Or Anthropic with a specific model
//! let llm = LlmFactory::anthropic_with_model("claude-3-5-sonnet-20240620")?;
//! ```

mod anthropic;
mod factory;
mod openai;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use openai::{OpenAIProvider, GROQ_API_BASE, GROQ_DEFAULT_MODEL, OPENAI_DEFAULT_MODEL};

// Re-export core types for convenience
pub use regwatch_core::config::LlmProvider;
pub use regwatch_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, ResponseFormat};
