//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction, the OpenAI-compatible client and the
//! retrying completion front end used by the conversation loop.

pub mod completion;
pub mod openai;
pub mod retry;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use completion::Completions;
pub use openai::OpenAIClient;
pub use retry::RetryPolicy;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
