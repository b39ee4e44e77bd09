//! Tool Types
//!
//! Types for MCP tool definitions and call results.
//! Per MCP 2025-06-18 schema lines 2353-2487.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::content::Content;
use crate::invoker::InvocationResult;

/// A tool definition as advertised by tools/list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Programmatic name of the tool.
    pub name: String,

    /// Human-readable title (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Description for the LLM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for input parameters.
    pub input_schema: ToolSchema,

    /// JSON Schema for structured output (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<ToolSchema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: Some(description.into()),
            input_schema: ToolSchema::empty(),
            output_schema: None,
            annotations: None,
        }
    }

    pub fn with_input_schema(mut self, schema: ToolSchema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn with_output_schema(mut self, schema: ToolSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Mark this tool as read-only (doesn't modify state).
    pub fn read_only(mut self) -> Self {
        let annotations = self.annotations.unwrap_or_default();
        self.annotations = Some(ToolAnnotations {
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            ..annotations
        });
        self
    }

    /// Mark this tool as idempotent.
    pub fn idempotent(mut self) -> Self {
        let annotations = self.annotations.unwrap_or_default();
        self.annotations = Some(ToolAnnotations {
            idempotent_hint: Some(true),
            ..annotations
        });
        self
    }
}

/// JSON Schema for tool input/output.
/// Per MCP 2025-06-18 schema lines 2369-2395.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Always "object" for tool schemas.
    #[serde(rename = "type")]
    pub schema_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
}

impl ToolSchema {
    /// Create an empty schema (no parameters).
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
            additional_properties: None,
        }
    }

    /// Create a schema from a JSON value. Anything but an object yields an
    /// empty schema.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::empty();
        };
        Self {
            schema_type: map
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("object")
                .to_string(),
            properties: map.get("properties").and_then(|v| v.as_object().cloned()),
            required: map.get("required").and_then(|v| v.as_array()).map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            }),
            additional_properties: map.get("additionalProperties").and_then(|v| v.as_bool()),
        }
    }

    /// Output schema for the call envelope wrapping a tool's result document.
    ///
    /// Tools always return `{status, result}` or `{status, kind, message}`, so
    /// the advertised schema describes that envelope with the tool-specific
    /// document nested under `result`.
    pub fn envelope(result_schema: Value) -> Self {
        let mut properties = Map::new();
        properties.insert(
            "status".to_string(),
            json!({ "type": "string", "enum": ["ok", "error"] }),
        );
        properties.insert("result".to_string(), result_schema);
        properties.insert(
            "kind".to_string(),
            json!({
                "type": "string",
                "enum": ["unknown_tool", "invalid_argument", "path_not_found", "adapter_error"]
            }),
        );
        properties.insert("message".to_string(), json!({ "type": "string" }));

        Self {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: Some(vec!["status".to_string()]),
            additional_properties: None,
        }
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::empty()
    }
}

/// Tool behavior annotations.
/// Per MCP 2025-06-18 schema lines 2438-2463.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// If true, the tool doesn't modify state. Default: false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,

    /// If true, the tool may perform destructive updates. Default: true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,

    /// If true, repeated calls have no additional effect. Default: false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,

    /// If true, the tool interacts with external entities. Default: true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

/// Parameters for tools/call request.
/// Per MCP 2025-06-18 schema lines 126-154.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

/// Result of a tool call.
/// Per MCP 2025-06-18 schema lines 155-184.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl CallToolResult {
    /// Create an error result carrying only a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
            structured_content: None,
        }
    }
}

impl From<InvocationResult> for CallToolResult {
    /// The envelope travels twice: pretty-printed as text for clients that
    /// only read content blocks, and as structured content.
    fn from(result: InvocationResult) -> Self {
        let is_error = result.is_failure();
        let envelope = result.to_value();
        let text = serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string());

        Self {
            content: vec![Content::text(text)],
            is_error,
            structured_content: Some(envelope),
        }
    }
}

/// Result of tools/list request.
/// Per MCP 2025-06-18 schema lines 1261-1284.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ListToolsResult {
    /// Create a result with all tools (no pagination).
    pub fn all(tools: Vec<Tool>) -> Self {
        Self {
            tools,
            next_cursor: None,
        }
    }
}
