//! Content Types
//!
//! Content blocks returned inside tool results.
//! Per MCP 2025-06-18 schema lines 428-446.

use serde::{Deserialize, Serialize};

/// Content block in a tool result.
///
/// Introspection tools only ever produce text; the enum stays tagged so the
/// wire shape matches the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Text content.
    Text { text: String },
}

impl Content {
    /// Create text content.
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    /// Get the text if this is text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
        }
    }
}
