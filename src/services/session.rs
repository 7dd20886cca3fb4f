//! In-memory session store using moka
//!
//! Each browser gets an opaque random token (the `session` cookie) that maps
//! to its own [`SessionState`] behind its own async mutex. Sessions expire
//! after a configurable idle period; nothing is persisted.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::SessionState;

/// Shared handle to one session's state.
///
/// Holding the lock across a generation keeps each session to one request
/// at a time without blocking other sessions.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Session store keyed by cookie token
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, SessionHandle>,
    idle_timeout: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("entry_count", &self.sessions.entry_count())
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl SessionStore {
    /// Create a store that drops sessions idle for longer than `idle_timeout`
    /// and holds at most `max_sessions` of them.
    pub fn new(idle_timeout: Duration, max_sessions: u64) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle_timeout)
            .build();
        Self {
            sessions,
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Start a fresh, unauthenticated session
    pub async fn create(&self) -> (String, SessionHandle) {
        let token = Uuid::new_v4().simple().to_string();
        let handle: SessionHandle = Arc::new(Mutex::new(SessionState::new()));
        self.sessions.insert(token.clone(), handle.clone()).await;
        tracing::debug!("Session created");
        (token, handle)
    }

    /// Look up a live session
    pub async fn get(&self, token: &str) -> Option<SessionHandle> {
        self.sessions.get(token).await
    }

    /// Look up `token`, or start a new session when it is missing or expired.
    ///
    /// The flag is true when a new session was created.
    pub async fn get_or_create(&self, token: Option<&str>) -> (String, SessionHandle, bool) {
        if let Some(token) = token {
            if let Some(handle) = self.get(token).await {
                return (token.to_string(), handle, false);
            }
        }
        let (token, handle) = self.create().await;
        (token, handle, true)
    }

    /// Drop a session
    pub async fn remove(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }
}
