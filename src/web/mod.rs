//! Web module - the HTTP surface
//!
//! One chat page, a form post per turn and two static directories.

pub mod page;
pub mod routes;

use std::sync::Arc;

use crate::agent::Agent;
use crate::core::{Config, ConnectError, Result};

pub use page::PageRenderer;
pub use routes::{router, AppState, ChatForm, ChatReply, SESSION_COOKIE};

/// Bind the configured address and serve until the process is stopped
pub async fn serve(config: &Config, agent: Agent) -> Result<()> {
    let state = Arc::new(AppState::new(agent, &config.server)?);
    let app = router(state, &config.server);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ConnectError::with_context(format!("Failed to bind to {}", addr), e))?;

    tracing::info!("DisasterConnect listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ConnectError::with_context("Server error", e))?;

    tracing::info!("Server stopped");
    Ok(())
}
