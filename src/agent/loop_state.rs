//! Conversation loop states
//!
//! The state is never stored; it is read off the conversation each time a
//! request arrives.

use crate::agent::conversation::Conversation;
use crate::core::UserRole;

/// Where a conversation is in the greeting / role / chat sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Nothing shown yet
    AwaitGreeting,
    /// The latest bot entry shows the role menu
    AwaitUserType,
    Conversing,
}

/// What to do with one piece of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SelectRole(UserRole),
    Converse,
}

impl LoopState {
    pub fn of(conversation: &Conversation) -> Self {
        if conversation.is_fresh() {
            Self::AwaitGreeting
        } else if conversation.role_menu_pending() {
            Self::AwaitUserType
        } else {
            Self::Conversing
        }
    }

    /// Route input received in this state
    ///
    /// Only "1" through "4" take the role path while the menu is pending;
    /// anything else is handled as ordinary conversation.
    pub fn route(self, input: &str) -> Route {
        match self {
            Self::AwaitUserType => match UserRole::from_selection(input) {
                Some(role) => Route::SelectRole(role),
                None => Route::Converse,
            },
            Self::AwaitGreeting | Self::Conversing => Route::Converse,
        }
    }
}
