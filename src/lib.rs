//! DisasterConnect - disaster relief chat assistant
//!
//! A web chat front end that routes user messages through an
//! OpenAI-compatible completion API, optionally augments them with context
//! retrieved from a Pinecone-compatible vector index, and lets the model call
//! weather, shelter, air quality and email tools.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Provider abstraction, OpenAI client and the retrying completion wrapper
//! - **Retrieval**: Embedding, vector search and corpus ingestion
//! - **Tools**: Tool registry and the built-in tools
//! - **Format**: Markdown-ish reply text to chat markup
//! - **Agent**: The conversation loop and per-session state
//! - **Web**: Axum routes and the chat page
//! - **CLI**: Command-line parsing and commands
//!
//! # Usage
//!
//! ```rust,no_run
//! use disasterconnect::{agent::Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> disasterconnect::Result<()> {
//!     let config = Config::load();
//!     let agent = Agent::from_config(&config).await?;
//!
//!     let mut conversation = agent.new_conversation();
//!     agent.greet(&mut conversation).await;
//!     let reply = agent.respond(&mut conversation, "Where is the nearest shelter?").await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod format;
pub mod llm;
pub mod retrieval;
pub mod tools;
pub mod web;

// Re-export commonly used items
pub use agent::{Agent, Conversation, SessionStore};
pub use core::{Config, ConnectError, Result};
pub use format::format_response;
