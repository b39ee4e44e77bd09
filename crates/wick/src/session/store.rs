//! Session Store
//!
//! Trait and in-memory implementation for session storage.
//!
//! Lifecycle spans:
//! - `mcp.session.create` - Session creation (new or resumed)
//! - `mcp.session.expire` - Idle sessions removed by cleanup

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use super::Session;
use crate::types::protocol::Implementation;

/// Statistics about active sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: usize,
    /// Sessions that completed the initialize handshake.
    pub initialized: usize,
}

/// Session store trait for pluggable storage backends.
pub trait SessionStore: Send + Sync {
    /// Get an existing session or create a new one.
    /// A hint that does not exist yet creates a session with that ID;
    /// no hint generates a UUID.
    fn get_or_create(&self, id_hint: Option<&str>) -> String;

    /// Snapshot of a session.
    fn get(&self, id: &str) -> Option<Session>;

    fn touch(&self, id: &str);

    fn set_initialized(&self, id: &str, client_info: Implementation);

    /// Remove sessions idle longer than `max_idle`; sessions that never
    /// initialized get a sixth of that. Returns the number removed.
    fn cleanup(&self, max_idle: Duration) -> usize;

    fn remove(&self, id: &str) -> bool;

    fn stats(&self) -> SessionStats;
}

/// In-memory session store using DashMap.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_or_create(&self, id_hint: Option<&str>) -> String {
        let id = id_hint
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut is_new = false;
        self.sessions.entry(id.clone()).or_insert_with(|| {
            is_new = true;
            Session::new(id.clone())
        });

        let _span = tracing::info_span!(
            "mcp.session.create",
            mcp.session_id = %id,
            mcp.session.is_new = is_new,
        )
        .entered();

        if is_new {
            tracing::info!("Created new session");
        } else {
            tracing::debug!("Resumed existing session");
        }

        id
    }

    fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    fn touch(&self, id: &str) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.touch();
        }
    }

    fn set_initialized(&self, id: &str, client_info: Implementation) {
        if let Some(mut session) = self.sessions.get_mut(id) {
            tracing::info!(
                session_id = %id,
                client_name = %client_info.name,
                client_version = %client_info.version,
                "Session initialized"
            );
            session.set_initialized(client_info);
        }
    }

    fn cleanup(&self, max_idle: Duration) -> usize {
        let _span = tracing::debug_span!("mcp.session.expire").entered();

        let to_remove: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| {
                let session = entry.value();
                let ttl = if session.initialized { max_idle } else { max_idle / 6 };
                session.idle_duration() > ttl
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in to_remove {
            if self.sessions.remove(&id).is_some() {
                tracing::info!(session_id = %id, "Removed stale session");
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(
                removed = removed,
                remaining = self.sessions.len(),
                "Session cleanup completed"
            );
        }

        removed
    }

    fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session removed");
        }
        removed
    }

    fn stats(&self) -> SessionStats {
        let initialized = self.sessions.iter().filter(|e| e.value().initialized).count();
        SessionStats {
            total: self.sessions.len(),
            initialized,
        }
    }
}

/// Spawn a background task that periodically cleans up stale sessions.
pub fn spawn_cleanup_task(
    store: Arc<dyn SessionStore>,
    interval: Duration,
    max_idle: Duration,
    cancel: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Session cleanup task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    store.cleanup(max_idle);
                }
            }
        }
    })
}
