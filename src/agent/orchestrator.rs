//! Agent orchestrator
//!
//! Runs one turn of a session's conversation: the greeting, the role menu
//! path, and the tool-augmented chat turn with optional retrieval. A chat turn
//! resolves at most one round of tool calls; tool calls in the reply to the
//! tool results are logged and ignored.

use std::sync::Arc;

use chrono::Local;

use crate::agent::conversation::Conversation;
use crate::agent::loop_state::{LoopState, Route};
use crate::agent::prompts;
use crate::core::{Config, ConnectError, Message, Result, UserRole};
use crate::format::format_response;
use crate::llm::{Completions, LLMProvider, OpenAIClient, RetryPolicy};
use crate::retrieval::{PineconeIndex, Retriever};
use crate::tools::ToolRegistry;

/// Drives conversations against one model, tool set and retriever
pub struct Agent {
    completions: Completions,
    tools: Arc<ToolRegistry>,
    retriever: Option<Retriever>,
    base_prompt: String,
}

impl Agent {
    pub fn new(
        completions: Completions,
        tools: ToolRegistry,
        retriever: Option<Retriever>,
        base_prompt: impl Into<String>,
    ) -> Self {
        Self {
            completions,
            tools: Arc::new(tools),
            retriever,
            base_prompt: base_prompt.into(),
        }
    }

    /// Build the agent the server runs: OpenAI client, built-in tools,
    /// Pinecone retrieval when configured, and the resource-backed base prompt
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(OpenAIClient::from_config(config)?);
        let completions = Completions::new(
            client.clone(),
            &config.openai.model,
            config.openai.temperature,
            RetryPolicy::from_config(&config.agent),
        );

        let tools = ToolRegistry::from_config(config)?;

        let retriever = if config.retrieval_ready() {
            let index = Arc::new(PineconeIndex::from_config(config)?);
            Some(Retriever::new(
                client.clone(),
                index,
                &config.pinecone.namespace,
                config.pinecone.top_k,
            ))
        } else {
            tracing::info!("Retrieval disabled");
            None
        };

        let resources = prompts::load_resources(&config.resources.files).await;

        tracing::info!(
            provider = client.name(),
            model = %config.openai.model,
            tools = ?tools.names(),
            retrieval = retriever.is_some(),
            "Agent ready"
        );

        Ok(Self::new(
            completions,
            tools,
            retriever,
            prompts::base_prompt(&resources),
        ))
    }

    /// A fresh conversation seeded with the base prompt
    pub fn new_conversation(&self) -> Conversation {
        Conversation::new(self.base_prompt.clone())
    }

    /// Show the greeting and role menu on a conversation with no history
    ///
    /// Returns `None` when the conversation has already started.
    pub async fn greet(&self, conversation: &mut Conversation) -> Option<String> {
        if LoopState::of(conversation) != LoopState::AwaitGreeting {
            return None;
        }

        let request = [
            Message::system(self.base_prompt.clone()),
            Message::user(prompts::GREETING_REQUEST),
        ];

        let greeting = match self.completions.complete(&request).await {
            Ok(text) => {
                let full = prompts::welcome_with_menu(&format_response(&text));
                conversation.push(Message::assistant(prompts::welcome_with_menu(&text)));
                full
            }
            Err(e) => {
                tracing::warn!("Greeting generation failed, using fixed welcome: {}", e);
                prompts::welcome_with_menu(prompts::FALLBACK_WELCOME)
            }
        };

        conversation.add_bot_entry(greeting.clone());
        Some(greeting)
    }

    /// Handle one piece of user input and return the markup shown for it
    ///
    /// Never fails: errors are logged and replaced by an apology recorded in
    /// the history. The context keeps whatever the turn appended before the
    /// failure.
    pub async fn respond(&self, conversation: &mut Conversation, input: &str) -> String {
        match LoopState::of(conversation).route(input) {
            Route::SelectRole(role) => self.select_role(conversation, input, role).await,
            Route::Converse => match self.converse(conversation, input).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!("Turn failed: {}", e);
                    conversation.add_bot_entry(prompts::APOLOGY);
                    prompts::APOLOGY.to_string()
                }
            },
        }
    }

    /// Role menu path: guidance for the chosen role, no tools
    async fn select_role(
        &self,
        conversation: &mut Conversation,
        input: &str,
        role: UserRole,
    ) -> String {
        tracing::info!(role = %role, "User selected role");
        conversation.add_user(input);

        let request = [
            Message::system(prompts::guidance_system(role)),
            Message::user(prompts::guidance_request(role)),
        ];

        let reply = match self.completions.complete(&request).await {
            Ok(guidance) => format_response(&guidance),
            Err(e) => {
                tracing::warn!("Role guidance failed, using fixed reply: {}", e);
                prompts::role_fallback(role)
            }
        };

        conversation.add_bot_entry(reply.clone());
        conversation.push(Message::system(prompts::role_note(role)));
        conversation.set_role(role);
        reply
    }

    /// Tool-augmented chat turn
    async fn converse(&self, conversation: &mut Conversation, input: &str) -> Result<String> {
        tracing::debug!(role = ?conversation.role(), "Conversation turn");
        conversation.add_user(input);

        if let Some(retriever) = &self.retriever {
            if let Some(text) = retriever.context_for(input).await? {
                conversation.push(Message::system(prompts::retrieved_context(&text)));
            }
        }

        let definitions = self.tools.definitions();
        let first = self
            .completions
            .request_with_tools(conversation.messages(), &definitions)
            .await?;

        let content = if first.has_tool_calls() {
            tracing::info!(calls = first.tool_calls.len(), "Resolving tool calls");
            conversation.push(Message::assistant_with_tools(
                first.content.clone(),
                first.tool_calls.clone(),
            ));

            let today = Local::now().date_naive();
            for call in &first.tool_calls {
                tracing::info!(tool = %call.name, id = %call.id, "Calling tool");
                let result = self.tools.execute_call(call, today).await;
                conversation.push(Message::tool(&call.id, result.to_string()));
            }

            let second = self
                .completions
                .request_with_tools(conversation.messages(), &definitions)
                .await?;
            if second.has_tool_calls() {
                tracing::warn!(
                    calls = second.tool_calls.len(),
                    "Ignoring tool calls in the reply to tool results"
                );
            }
            second.content
        } else {
            first.content
        };

        if content.trim().is_empty() {
            return Err(ConnectError::llm("Completion returned no content"));
        }

        let formatted = format_response(&content);
        conversation.push(Message::assistant(content));
        conversation.add_bot_entry(formatted.clone());
        Ok(formatted)
    }
}
