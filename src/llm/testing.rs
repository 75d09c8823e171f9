//! Scripted provider for loop and server tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::{ConnectError, Message, Result, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse};

/// Which provider method a request went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Plain,
    WithTools,
}

/// Provider replaying canned replies and recording every request
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<LLMResponse>>>,
    requests: Mutex<Vec<(RequestKind, Vec<Message>)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<LLMResponse>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        })
    }

    fn next(&self, kind: RequestKind, messages: &[Message]) -> Result<LLMResponse> {
        self.requests.lock().unwrap().push((kind, messages.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ConnectError::llm("script exhausted")))
    }

    pub fn requests(&self) -> Vec<(RequestKind, Vec<Message>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        _model: &str,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.next(RequestKind::Plain, messages)
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        messages: &[Message],
        _tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.next(RequestKind::WithTools, messages)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
