//! Per-session conversation state
//!
//! Holds the context sent to the model and the chat history shown on the
//! page. Both only ever grow; nothing is pruned or persisted.

use serde::Serialize;

use crate::agent::prompts::ROLE_MENU_MARKER;
use crate::core::{HistoryEntry, Message, Speaker, UserRole};

/// One user's conversation
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    /// Messages sent with every completion request, base prompt first
    #[serde(skip)]
    context: Vec<Message>,
    /// Entries rendered on the page
    history: Vec<HistoryEntry>,
    /// Role picked from the greeting menu, if any
    role: Option<UserRole>,
}

impl Conversation {
    /// Start a conversation whose context opens with the base prompt
    pub fn new(base_prompt: impl Into<String>) -> Self {
        Self {
            context: vec![Message::developer(base_prompt)],
            history: Vec::new(),
            role: None,
        }
    }

    /// Record user input in both the context and the history
    pub fn add_user(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.history.push(HistoryEntry::user(content.clone()));
        self.context.push(Message::user(content));
    }

    /// Append a message to the context only
    pub fn push(&mut self, message: Message) {
        self.context.push(message);
    }

    /// Append a bot entry to the history only
    pub fn add_bot_entry(&mut self, text: impl Into<String>) {
        self.history.push(HistoryEntry::bot(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.context
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Whether the latest history entry is a bot message showing the role menu
    pub fn role_menu_pending(&self) -> bool {
        self.history.last().is_some_and(|entry| {
            entry.speaker == Speaker::Bot && entry.text.to_lowercase().contains(ROLE_MENU_MARKER)
        })
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = Some(role);
    }

    /// Nothing has been shown yet
    pub fn is_fresh(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompts::{welcome_with_menu, FALLBACK_WELCOME};
    use crate::core::Role;

    #[test]
    fn test_conversation_basic() {
        let mut conv = Conversation::new("base prompt");
        assert!(conv.is_fresh());
        conv.add_user("Hello");
        conv.push(Message::assistant("Hi there!"));
        conv.add_bot_entry("Hi there!");

        assert_eq!(conv.messages().len(), 3);
        assert_eq!(conv.messages()[0].role, Role::Developer);
        assert_eq!(conv.history().len(), 2);
        assert_eq!(conv.history().last().unwrap().text, "Hi there!");
    }

    #[test]
    fn test_role_menu_pending() {
        let mut conv = Conversation::new("base prompt");
        assert!(!conv.role_menu_pending());

        conv.add_bot_entry(welcome_with_menu(FALLBACK_WELCOME));
        assert!(conv.role_menu_pending());

        conv.add_user("where is the nearest shelter?");
        assert!(!conv.role_menu_pending());
    }

    #[test]
    fn test_history_serializes_without_context() {
        let mut conv = Conversation::new("secret base prompt");
        conv.add_user("Hello");
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["history"][0]["speaker"], "user");
        assert!(json.get("context").is_none());
        assert!(!json.to_string().contains("secret base prompt"));
    }
}
