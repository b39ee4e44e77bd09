//! JSON-RPC error object.
//!
//! Protocol-level failures only: malformed messages, unknown methods, bad
//! params. Tool failures travel inside a successful `tools/call` reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC error data.
/// Per MCP 2025-06-18 schema lines 912-931.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional error data (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    // https://www.jsonrpc.org/specification#error_object

    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;

    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;

    /// The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;

    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Create a new error with code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(Self::PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(Self::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(Self::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL_ERROR, message)
    }

    /// Short machine name for the code, used as the `error.type` span attribute.
    pub fn kind(&self) -> &'static str {
        match self.code {
            Self::PARSE_ERROR => "parse_error",
            Self::INVALID_REQUEST => "invalid_request",
            Self::METHOD_NOT_FOUND => "method_not_found",
            Self::INVALID_PARAMS => "invalid_params",
            Self::INTERNAL_ERROR => "internal_error",
            _ => "application_error",
        }
    }
}

impl std::fmt::Display for ErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_not_found_serialization() {
        let error = ErrorData::method_not_found("resources/list");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], -32601);
        assert_eq!(json["message"], "Method not found: resources/list");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_error_with_data() {
        let error = ErrorData::invalid_params("Missing call params").with_data(json!({ "field": "name" }));
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], -32602);
        assert_eq!(json["data"]["field"], "name");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorData::parse_error("x").kind(), "parse_error");
        assert_eq!(ErrorData::internal_error("x").kind(), "internal_error");
        assert_eq!(ErrorData::new(-1, "x").kind(), "application_error");
    }
}
