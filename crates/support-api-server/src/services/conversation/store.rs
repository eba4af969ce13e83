use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::chat::{Role, Session};

/// First assistant turn seeded into every new session.
pub const GREETING: &str = "Hello! How can I help you today?";

/// Thread-safe in-memory session store.
///
/// Each entry is the single writable copy of a session, guarded by its own
/// async mutex so queries for the same session serialize while different
/// sessions never block one another.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Fetch a session, or create it with one seeded assistant greeting.
    /// The greeting is appended exactly once, at creation, and counts
    /// toward the session's message total.
    pub fn get_or_create(
        &self,
        session_id: &str,
        customer_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", session_id);
                let mut session = Session::new(session_id, customer_name, now);
                session.append(Role::Assistant, GREETING, now);
                Arc::new(Mutex::new(session))
            })
            .value()
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evict every session idle longer than the timeout. Sessions whose lock
    /// is held by an in-flight query are skipped; they are active by
    /// definition and will be revisited on the next sweep.
    pub fn sweep(&self, now: DateTime<Utc>, idle_timeout_seconds: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|session_id, slot| match slot.try_lock() {
            Ok(session) => {
                let expired = session.is_idle(now, idle_timeout_seconds);
                if expired {
                    info!("Cleaning up expired session {}", session_id);
                }
                !expired
            }
            Err(_) => true,
        });
        before.saturating_sub(self.sessions.len())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
