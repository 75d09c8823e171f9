//! Custom error types for DisasterConnect
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for DisasterConnect operations
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Completion or embedding API errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector index errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Page rendering errors
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An API key the operation needs was never configured
    #[error("{0} is not set. Add it to your environment or config file")]
    MissingApiKey(&'static str),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience Result type for DisasterConnect operations
pub type Result<T> = std::result::Result<T, ConnectError>;

impl ConnectError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a retrieval error
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }
}
