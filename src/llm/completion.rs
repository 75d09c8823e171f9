//! Completion requests as the conversation loop issues them
//!
//! Tool-bearing calls go through the retry policy; plain calls (greeting,
//! role guidance) do not, since their callers fall back to fixed text.

use std::sync::Arc;

use crate::core::{Message, Result, ToolDefinition};
use crate::llm::retry::RetryPolicy;
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse};

/// Completion front end bound to one model and temperature
#[derive(Clone)]
pub struct Completions {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl Completions {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        temperature: f32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            retry,
        }
    }

    /// Completion with tool schemas and `tool_choice = auto`, retried per policy
    pub async fn request_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let provider = self.provider.as_ref();
        let model = self.model.as_str();
        let temperature = self.temperature;

        self.retry
            .run("chat completion", move || {
                provider.chat_with_tools(
                    model,
                    messages,
                    tools,
                    Some(GenerateOptions::with_temperature(temperature)),
                )
            })
            .await
    }

    /// Single plain completion returning only the text
    pub async fn complete(&self, messages: &[Message]) -> Result<String> {
        let reply = self
            .provider
            .chat(
                &self.model,
                messages,
                Some(GenerateOptions::with_temperature(self.temperature)),
            )
            .await?;
        Ok(reply.content)
    }
}
