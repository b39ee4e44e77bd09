//! MCP Protocol Dispatch
//!
//! Routes JSON-RPC methods to the [`Handler`]. Both transports funnel every
//! incoming message through [`handle_value`] so they answer identically.
//!
//! Implements OpenTelemetry JSON-RPC semantic conventions for observability.
//! See: https://opentelemetry.io/docs/specs/semconv/rpc/json-rpc/

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::transport::McpState;
use crate::types::error::ErrorData;
use crate::types::jsonrpc::{JsonRpcMessage, JsonRpcReply};
use crate::types::protocol::{Implementation, InitializeParams, InitializeResult, ServerCapabilities};
use crate::types::tool::{CallToolParams, CallToolResult, ListToolsResult, Tool};

/// Handler trait for MCP server implementations.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Advertised tools, in a stable order.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call. Tool-level failures belong in the returned
    /// [`CallToolResult`]; `Err` is for protocol failures only.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult, ErrorData>;

    fn server_info(&self) -> Implementation;

    /// Return instructions for the LLM.
    fn instructions(&self) -> Option<String> {
        None
    }

    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::default().enable_tools()
    }
}

/// What a transport should do with one incoming message.
#[derive(Debug)]
pub enum Outcome {
    /// A request was dispatched; send the reply.
    Reply(JsonRpcReply),
    /// The message was not valid JSON-RPC; send the error reply.
    Rejected(JsonRpcReply),
    /// A notification; send nothing.
    Notification,
}

/// Handle one raw line of text (stdio framing).
pub async fn handle_text<H: Handler>(state: &Arc<McpState<H>>, session_id: &str, text: &str) -> Outcome {
    match serde_json::from_str::<Value>(text) {
        Ok(body) => handle_value(state, session_id, body).await,
        Err(e) => Outcome::Rejected(JsonRpcReply::failure(
            Value::Null,
            ErrorData::parse_error(format!("Parse error: {}", e)),
        )),
    }
}

/// Handle one parsed JSON value.
pub async fn handle_value<H: Handler>(state: &Arc<McpState<H>>, session_id: &str, body: Value) -> Outcome {
    // Kept for the error reply when the envelope itself is malformed.
    let raw_id = body.get("id").cloned().unwrap_or(Value::Null);

    // A present-but-null id is neither a request nor a notification.
    if body.get("id") == Some(&Value::Null) {
        return Outcome::Rejected(JsonRpcReply::failure(
            Value::Null,
            ErrorData::invalid_request("Invalid JSON-RPC: id must not be null"),
        ));
    }

    let message: JsonRpcMessage = match serde_json::from_value(body) {
        Ok(message) => message,
        Err(e) => {
            return Outcome::Rejected(JsonRpcReply::failure(
                raw_id,
                ErrorData::invalid_request(format!("Invalid JSON-RPC: {}", e)),
            ))
        }
    };

    let Some(request_id) = message.id.clone() else {
        match message.method.as_str() {
            "notifications/initialized" => {
                tracing::info!(session_id = %session_id, "Client initialized notification received");
            }
            "notifications/cancelled" => {
                tracing::info!(session_id = %session_id, "Request cancelled notification received");
            }
            other => {
                tracing::debug!(method = %other, "Unknown notification received");
            }
        }
        return Outcome::Notification;
    };

    tracing::debug!(method = %message.method, request_id = %request_id, "Processing MCP request");
    let result = dispatch(state, session_id, &message).await;
    Outcome::Reply(JsonRpcReply::for_request(&request_id, result))
}

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Creates a span following JSON-RPC semantic conventions:
/// - `rpc.system` = "jsonrpc"
/// - `rpc.method` = the JSON-RPC method name
/// - `rpc.jsonrpc.request_id` = the request ID (if present)
/// - `mcp.session_id` = the MCP session identifier
pub async fn dispatch<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let request_id = message.id.as_ref().map(|id| id.to_string()).unwrap_or_default();

    let span = tracing::info_span!(
        "mcp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %message.method,
        rpc.jsonrpc.version = "2.0",
        rpc.jsonrpc.request_id = %request_id,
        mcp.session_id = %session_id,
        error.type = tracing::field::Empty,
        rpc.jsonrpc.error_code = tracing::field::Empty,
        rpc.jsonrpc.error_message = tracing::field::Empty,
    );

    async {
        let result = dispatch_inner(state, session_id, message).await;
        if let Err(ref error) = result {
            record_error_on_span(error);
        }
        result
    }
    .instrument(span)
    .await
}

fn record_error_on_span(error: &ErrorData) {
    let span = tracing::Span::current();
    span.record("error.type", error.kind());
    span.record("rpc.jsonrpc.error_code", error.code);
    span.record("rpc.jsonrpc.error_message", error.message.as_str());
}

async fn dispatch_inner<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    match message.method.as_str() {
        "initialize" => handle_initialize(state, session_id, message),
        "notifications/initialized" | "notifications/cancelled" => Ok(Value::Null),
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => to_result(&ListToolsResult::all(state.handler.tools())),
        "tools/call" => handle_call_tool(state, session_id, message).await,
        _ => Err(ErrorData::method_not_found(&message.method)),
    }
}

fn handle_initialize<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: InitializeParams = params(request, "initialize")?;

    state.sessions.set_initialized(session_id, params.client_info);

    let result = InitializeResult::new(state.handler.server_info(), state.handler.capabilities());
    let result = match state.handler.instructions() {
        Some(instructions) => result.with_instructions(instructions),
        None => result,
    };

    to_result(&result)
}

async fn handle_call_tool<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    request: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CallToolParams = params(request, "call")?;
    let arguments = params.arguments.unwrap_or_default();

    let tool_span = tracing::info_span!(
        "mcp.tool.call",
        mcp.tool.name = %params.name,
        mcp.session_id = %session_id,
    );

    async {
        let result = state.handler.call_tool(&params.name, arguments).await?;
        to_result(&result)
    }
    .instrument(tool_span)
    .await
}

fn params<T: DeserializeOwned>(request: &JsonRpcMessage, what: &str) -> Result<T, ErrorData> {
    request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| ErrorData::invalid_params(format!("Invalid {} params: {}", what, e)))?
        .ok_or_else(|| ErrorData::invalid_params(format!("Missing {} params", what)))
}

fn to_result<T: serde::Serialize>(result: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}
