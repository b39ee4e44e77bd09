//! wick - read-only tool serving over MCP (Model Context Protocol)
//!
//! A small library for exposing a catalog of read-only introspection tools to
//! AI assistants over MCP 2025-06-18.
//!
//! # Pieces
//!
//! - **Registry**: the static catalog of tools, their argument schemas and the
//!   adapter functions behind them. Populated once at startup.
//! - **Invoker**: the single choke point for tool calls. Looks a tool up,
//!   validates arguments, runs the adapter and normalizes the outcome into an
//!   [`InvocationResult`].
//! - **Protocol**: JSON-RPC method dispatch through the [`Handler`] trait.
//! - **Transports**: newline-delimited stdio and streamable HTTP (axum).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use wick::{ArgSpec, ArgType, Invoker, Registry, ToolDescriptor};
//!
//! struct Host { greeting: String }
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     ToolDescriptor::new("greet", "Greet someone")
//!         .with_argument(ArgSpec::required("name", ArgType::String)),
//!     |host: &Host, args| Ok(json!(format!("{} {}", host.greeting, args.str("name")?))),
//! )?;
//!
//! let invoker = Invoker::new(Arc::new(registry), Arc::new(Host { greeting: "hi".into() }));
//! let result = invoker.invoke("greet", json!({"name": "ada"}).as_object().cloned().unwrap()).await;
//! ```

pub mod adapter;
pub mod arguments;
pub mod dotpath;
pub mod invoker;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod session;
pub mod transport;
pub mod types;

// Core contract
pub use adapter::{Adapter, AdapterError};
pub use arguments::{ArgSpec, ArgType, ArgumentError, ArgumentSchema, Arguments};
pub use dotpath::{resolve, PathNotFound};
pub use invoker::{ErrorKind, InvocationRequest, InvocationResult, InvocationState, Invoker};
pub use registry::{RegisteredTool, Registry, RegistryError, ToolDescriptor};

// Protocol types
pub use types::content::Content;
pub use types::error::ErrorData;
pub use types::jsonrpc::{JsonRpcMessage, JsonRpcReply, RequestId};
pub use types::protocol::{Implementation, ServerCapabilities};
pub use types::tool::{CallToolResult, Tool, ToolAnnotations, ToolSchema};

// Protocol dispatch
pub use protocol::Handler;

// Sessions and transports
pub use session::{spawn_cleanup_task, InMemorySessionStore, Session, SessionStats, SessionStore};
pub use transport::{serve_stdio, streamable_router, McpState};

pub use schema::schema_for;
