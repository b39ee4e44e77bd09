//! Session Management
//!
//! MCP session lifecycle over streamable HTTP: creation, resumption,
//! initialization and idle cleanup. The stdio transport uses one fixed
//! session for the life of the pipe.

mod store;

pub use store::{spawn_cleanup_task, InMemorySessionStore, SessionStats, SessionStore};

use std::time::{Duration, Instant};

use crate::types::protocol::Implementation;

/// An MCP session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: Instant,
    pub last_seen: Instant,

    /// Client implementation info (set by initialize).
    pub client_info: Option<Implementation>,

    pub initialized: bool,
}

impl Session {
    pub fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_seen: now,
            client_info: None,
            initialized: false,
        }
    }

    /// Time since last activity.
    pub fn idle_duration(&self) -> Duration {
        self.last_seen.elapsed()
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn set_initialized(&mut self, client_info: Implementation) {
        self.initialized = true;
        self.client_info = Some(client_info);
        self.touch();
    }
}
