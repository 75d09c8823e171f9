//! Agent module - orchestration and conversation management
//!
//! Contains the conversation loop that coordinates completions, retrieval
//! and tool execution, plus the per-session state it operates on.

pub mod conversation;
pub mod loop_state;
pub mod orchestrator;
pub mod prompts;
pub mod session;

pub use conversation::Conversation;
pub use loop_state::{LoopState, Route};
pub use orchestrator::Agent;
pub use session::{SessionHandle, SessionStore};
