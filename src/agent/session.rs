//! Session store
//!
//! Maps a client-held identifier to its conversation. Turns in one session
//! serialize on that session's mutex; different sessions proceed in parallel.
//! Sessions idle longer than the TTL are swept on each `open`, and when the
//! store is full the least recently used session is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::conversation::Conversation;
use crate::core::config::ServerConfig;

/// Shared handle to one session's conversation
pub type SessionHandle = Arc<Mutex<Conversation>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// All live sessions, in memory only
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    idle_ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        Self::new(
            Duration::from_secs(server.session_ttl_secs),
            server.max_sessions,
        )
    }

    /// Look up the session for `id`, creating one when the id is absent or unknown
    ///
    /// Unknown ids are replaced by a fresh one rather than adopted, so clients
    /// cannot choose their own identifiers.
    pub async fn open<F>(&self, id: Option<&str>, create: F) -> (String, SessionHandle)
    where
        F: FnOnce() -> Conversation,
    {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let ttl = self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < ttl);
        if sessions.len() < before {
            tracing::debug!(expired = before - sessions.len(), "Swept idle sessions");
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(id) {
                entry.last_seen = now;
                return (id.to_string(), Arc::clone(&entry.handle));
            }
        }

        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    sessions.remove(&oldest);
                    tracing::debug!(session = %oldest, "Evicted least recently used session");
                }
                None => break,
            }
        }

        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(create()));
        sessions.insert(
            id.clone(),
            Entry {
                handle: Arc::clone(&handle),
                last_seen: now,
            },
        );
        tracing::debug!(session = %id, live = sessions.len(), "Created session");
        (id, handle)
    }
}
