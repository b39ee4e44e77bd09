//! MCP Transports
//!
//! ## Streamable HTTP
//! - POST / - Send JSON-RPC request, receive response directly
//! - DELETE / - Terminate session
//! - Session ID via Mcp-Session-Id header
//!
//! ## stdio
//! - Newline-delimited JSON-RPC on stdin, replies on stdout

mod stdio;
mod streamable;

pub use stdio::{serve_lines, serve_stdio, STDIO_SESSION};
pub use streamable::{delete_handler, streamable_handler, SESSION_HEADER};

use std::sync::Arc;

use axum::Router;

use crate::session::{InMemorySessionStore, SessionStore};

/// Shared state for MCP handlers.
pub struct McpState<H> {
    pub handler: Arc<H>,
    pub sessions: Arc<dyn SessionStore>,
}

impl<H> McpState<H> {
    pub fn new(handler: H) -> Self {
        Self::with_session_store(handler, Arc::new(InMemorySessionStore::new()))
    }

    pub fn with_session_store(handler: H, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            handler: Arc::new(handler),
            sessions,
        }
    }
}

/// Build an axum Router for MCP Streamable HTTP transport.
///
/// Routes:
/// - POST / - JSON-RPC request/response
/// - DELETE / - Session termination
pub fn streamable_router<H>(state: Arc<McpState<H>>) -> Router
where
    H: crate::Handler + 'static,
{
    Router::new()
        .route(
            "/",
            axum::routing::post(streamable_handler::<H>).delete(delete_handler::<H>),
        )
        .with_state(state)
}
