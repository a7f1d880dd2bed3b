//! In-process session store.
//!
//! Sessions live in a `DashMap` keyed by user id, each with an absolute
//! expiry. Expired entries are treated as absent on read and removed by
//! [`InMemorySessionStore::purge_expired`], which the server runs on a timer.
//! Suitable for a single instance; state is lost on restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use foodbites_types::errors::BotError;
use foodbites_types::traits::{Clock, SessionStore, SystemClock};
use foodbites_types::SessionState;

/// A stored session and when it stops being valid.
#[derive(Debug, Clone)]
struct Entry {
    state: SessionState,
    expires_at: DateTime<Utc>,
}

/// Thread-safe in-memory session store with per-entry expiry.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Remove every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "purged expired sessions");
        }
        removed
    }

    /// Number of stored sessions, expired or not.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<SessionState, BotError> {
        let now = self.clock.now();
        if let Some(entry) = self.sessions.get(user_id) {
            if entry.expires_at > now {
                return Ok(entry.state.clone());
            }
        }
        // Lazy expiry; the guard above is released before removing.
        self.sessions
            .remove_if(user_id, |_, entry| entry.expires_at <= now);
        Ok(SessionState::default())
    }

    async fn put(
        &self,
        user_id: &str,
        state: &SessionState,
        ttl: std::time::Duration,
    ) -> Result<(), BotError> {
        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| BotError::Session(format!("session ttl {ttl:?} out of range")))?;
        self.sessions.insert(
            user_id.to_string(),
            Entry {
                state: state.clone(),
                expires_at,
            },
        );
        Ok(())
    }
}
