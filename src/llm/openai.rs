//! OpenAI-compatible client implementation
//!
//! Async HTTP client for the chat completions and embeddings endpoints.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{Config, ConnectError, Message, Result, Role, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
use crate::retrieval::Embedder;

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

/// Message in the provider's wire format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    /// Null for assistant turns that only call tools
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON encoded as a string
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAIClient {
    /// Create a new client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()
            .map_err(|e| ConnectError::with_context("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.openai.base_url.trim_end_matches('/').to_string(),
            api_key: config.openai.api_key.clone(),
            embedding_model: config.openai.embedding_model.clone(),
        })
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: Some(api_key.into()),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(ConnectError::MissingApiKey("OPENAI_API_KEY"))
    }

    /// Convert internal Message to the wire format
    fn to_wire_message(msg: &Message) -> WireMessage {
        let tool_calls = msg.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|tc| WireToolCall {
                    id: tc.id.clone(),
                    call_type: function_type(),
                    function: WireFunction {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect::<Vec<_>>()
        });

        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };

        WireMessage {
            role: msg.role,
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    /// Convert a provider response to LLMResponse
    fn to_llm_response(response: ChatResponse) -> Result<LLMResponse> {
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ConnectError::llm("Completion returned no choices"))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        Ok(LLMResponse {
            content: message.content.unwrap_or_default(),
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: response.model,
        })
    }

    async fn send_chat(&self, request: &ChatRequest<'_>) -> Result<LLMResponse> {
        let api_key = self.api_key()?;
        tracing::debug!(
            model = request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ConnectError::llm(format!("Cannot connect to {}", self.base_url))
                } else {
                    ConnectError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConnectError::llm(format!(
                "Completion API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| ConnectError::llm(format!("Failed to parse response: {}", e)))?;

        let reply = Self::to_llm_response(chat_response)?;
        if let Some(ref usage) = reply.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion finished"
            );
        }
        Ok(reply)
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            temperature: options.temperature,
            tools: None,
            tool_choice: None,
        };
        self.send_chat(&request).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            temperature: options.temperature,
            tools: (!tools.is_empty()).then_some(tools),
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };
        self.send_chat(&request).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl Embedder for OpenAIClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&EmbeddingRequest {
                model: &self.embedding_model,
                input: text,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConnectError::llm(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ConnectError::llm(format!("Failed to parse embedding: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ConnectError::llm("Embedding response was empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_message_conversion() {
        let msg = Message::user("Hello");
        let wire = OpenAIClient::to_wire_message(&msg);
        assert_eq!(wire.role, Role::User);
        assert_eq!(wire.content.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_tool_only_assistant_has_null_content() {
        let msg = Message::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "get_current_weather", "{}")],
        );
        let wire = serde_json::to_value(OpenAIClient::to_wire_message(&msg)).unwrap();
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "get_current_weather");
    }

    #[tokio::test]
    async fn test_chat_with_tools_parses_tool_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "tool_choice": "auto",
                "temperature": 0.0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "model": "gpt-4o-mini",
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_abc",
                                "type": "function",
                                "function": {
                                    "name": "get_current_weather",
                                    "arguments": "{\"latitude\":37.7749,\"longitude\":-122.4194}"
                                }
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenAIClient::with_base_url(server.url(), "sk-test");
        let tools = vec![ToolDefinition::function(
            "get_current_weather",
            "weather",
            json!({"type": "object"}),
            true,
        )];
        let reply = client
            .chat_with_tools(
                "gpt-4o-mini",
                &[Message::user("weather in SF?")],
                &tools,
                Some(GenerateOptions::with_temperature(0.0)),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.content, "");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "call_abc");
        assert_eq!(reply.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_api_error_status_is_llm_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = OpenAIClient::with_base_url(server.url(), "sk-test");
        let err = client
            .chat("gpt-4o-mini", &[Message::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::Llm(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_embed_returns_first_vector() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embeddings")
            .match_body(Matcher::PartialJson(json!({"model": "text-embedding-3-small"})))
            .with_status(200)
            .with_body(json!({"data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]}).to_string())
            .create_async()
            .await;

        let client = OpenAIClient::with_base_url(server.url(), "sk-test");
        let vector = client.embed("flood shelters").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let mut config = Config::default();
        config.openai.api_key = None;
        let client = OpenAIClient::from_config(&config).unwrap();
        let err = client.chat("m", &[Message::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, ConnectError::MissingApiKey(_)));
    }
}
