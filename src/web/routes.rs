//! HTTP routes
//!
//! `GET /` renders the chat, `POST /` runs one turn. Script-driven posts
//! (`X-Requested-With: XMLHttpRequest`) get JSON instead of the page.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::agent::{Agent, SessionStore};
use crate::core::config::ServerConfig;
use crate::core::{ConnectError, HistoryEntry, Result};
use crate::web::page::PageRenderer;

/// Cookie carrying the session identifier
pub const SESSION_COOKIE: &str = "dc_session";

/// Server shared state
pub struct AppState {
    pub agent: Agent,
    pub sessions: SessionStore,
    pub page: PageRenderer,
}

impl AppState {
    pub fn new(agent: Agent, server: &ServerConfig) -> Result<Self> {
        Ok(Self {
            agent,
            sessions: SessionStore::from_config(server),
            page: PageRenderer::new()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub user_input: String,
}

/// Body returned to script-driven posts
#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub history: Vec<HistoryEntry>,
}

impl IntoResponse for ConnectError {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(index).post(chat))
        .nest_service("/images", ServeDir::new(&server.images_dir))
        .nest_service("/css", ServeDir::new(&server.css_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Session id presented in the request cookies, if any
fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Attach the session cookie when the client did not already send this id
fn with_session_cookie(mut response: Response, presented: Option<&str>, id: &str) -> Response {
    if presented == Some(id) {
        return response;
    }
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!("Could not encode session cookie: {}", e),
    }
    response
}

/// GET / - greet a new session and render the chat
async fn index(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response> {
    let presented = session_id(&headers);
    let (id, session) = state
        .sessions
        .open(presented.as_deref(), || state.agent.new_conversation())
        .await;

    let mut conversation = session.lock().await;
    state.agent.greet(&mut conversation).await;
    let html = state.page.render(conversation.history())?;

    Ok(with_session_cookie(
        Html(html).into_response(),
        presented.as_deref(),
        &id,
    ))
}

/// POST / - run one turn for the session
async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Result<Response> {
    let presented = session_id(&headers);
    let (id, session) = state
        .sessions
        .open(presented.as_deref(), || state.agent.new_conversation())
        .await;

    let mut conversation = session.lock().await;
    state.agent.greet(&mut conversation).await;

    let input = form.user_input.trim();
    let reply = if input.is_empty() {
        tracing::debug!(session = %id, "Ignoring empty input");
        String::new()
    } else {
        tracing::debug!(session = %id, "Handling chat turn");
        state.agent.respond(&mut conversation, input).await
    };

    let response = if is_xhr(&headers) {
        Json(ChatReply {
            reply,
            history: conversation.history().to_vec(),
        })
        .into_response()
    } else {
        Html(state.page.render(conversation.history())?).into_response()
    };

    Ok(with_session_cookie(response, presented.as_deref(), &id))
}
