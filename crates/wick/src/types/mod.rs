//! MCP Protocol Types
//!
//! The subset of the MCP 2025-06-18 schema a tools-only server needs:
//!
//! - `jsonrpc` - JSON-RPC 2.0 envelopes (incoming messages, outgoing replies)
//! - `error` - JSON-RPC error object with the standard codes
//! - `protocol` - initialize handshake and capability negotiation
//! - `tool` - tool definitions and call results
//! - `content` - content blocks carried by tool results

pub mod content;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod tool;
