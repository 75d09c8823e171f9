//! Shared types used across DisasterConnect modules
//!
//! Contains message structures, tool definitions, chat history entries and user roles.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Role of a message in the conversation context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Top-level instructions (the base prompt)
    Developer,
    /// Injected notes such as retrieved context or the user's role
    System,
    User,
    Assistant,
    /// Result of a tool invocation
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Developer => write!(f, "developer"),
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Tool calls requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Id of the call a tool message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a developer (base prompt) message
    pub fn developer(content: impl Into<String>) -> Self {
        Self::with_role(Role::Developer, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Create a tool-role message answering `call_id`
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-issued call id, echoed back on the tool message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Raw JSON argument text as produced by the model
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the argument text into a JSON object
    pub fn parse_arguments(&self) -> serde_json::Result<serde_json::Value> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
    /// Whether the provider must follow the schema exactly
    pub strict: bool,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
        strict: bool,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
                strict,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Who produced a chat history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

/// One displayed line of the chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Text as displayed; bot text is already markup
    pub text: String,
    pub speaker: Speaker,
    /// Local time, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::now(text, Speaker::User)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::now(text, Speaker::Bot)
    }

    fn now(text: impl Into<String>, speaker: Speaker) -> Self {
        Self {
            text: text.into(),
            speaker,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// The role a user picks from the greeting menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    SurvivorCaregiver,
    ProviderDonor,
    ConcernedPublic,
    ReliefOrganization,
}

impl UserRole {
    /// Parse a menu selection ("1" through "4")
    pub fn from_selection(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::SurvivorCaregiver),
            "2" => Some(Self::ProviderDonor),
            "3" => Some(Self::ConcernedPublic),
            "4" => Some(Self::ReliefOrganization),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SurvivorCaregiver => "Survivor/Caregiver",
            Self::ProviderDonor => "Provider/Donor",
            Self::ConcernedPublic => "Concerned Public",
            Self::ReliefOrganization => "Relief Organization",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
