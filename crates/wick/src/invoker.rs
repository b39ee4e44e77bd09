//! The invoker: the single choke point for tool calls.
//!
//! Each call walks `Received -> Validated -> Executing -> Succeeded | Failed`
//! exactly once and yields exactly one [`InvocationResult`]. Nothing an
//! adapter does (error or panic) escapes as anything else.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info_span, warn, Instrument, Span};

use crate::registry::Registry;

/// Machine-checkable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    InvalidArgument,
    PathNotFound,
    AdapterError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::PathNotFound => "path_not_found",
            ErrorKind::AdapterError => "adapter_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an invocation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Received,
    Validated,
    Executing,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Outcome of one invocation, serialized as the caller-facing envelope:
/// `{"status":"ok","result":…}` or `{"status":"error","kind":…,"message":…}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum InvocationResult {
    #[serde(rename = "ok")]
    Success {
        #[serde(rename = "result")]
        document: Value,
    },
    #[serde(rename = "error")]
    Failure { kind: ErrorKind, message: String },
}

impl InvocationResult {
    pub fn success(document: Value) -> Self {
        Self::Success { document }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn document(&self) -> Option<&Value> {
        match self {
            Self::Success { document } => Some(document),
            Self::Failure { .. } => None,
        }
    }

    /// The envelope as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Success { document } => json!({ "status": "ok", "result": document }),
            Self::Failure { kind, message } => {
                json!({ "status": "error", "kind": kind, "message": message })
            }
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::Success { .. } => "ok",
            Self::Failure { kind, .. } => kind.as_str(),
        }
    }
}

/// Validates, executes and normalizes tool calls against a shared host
/// context. Cheap to clone.
pub struct Invoker<C> {
    registry: Arc<Registry<C>>,
    host: Arc<C>,
}

impl<C> Clone for Invoker<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            host: Arc::clone(&self.host),
        }
    }
}

impl<C: Send + Sync + 'static> Invoker<C> {
    pub fn new(registry: Arc<Registry<C>>, host: Arc<C>) -> Self {
        Self { registry, host }
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    pub fn host(&self) -> &C {
        &self.host
    }

    pub async fn invoke_request(&self, request: InvocationRequest) -> InvocationResult {
        self.invoke(&request.tool_name, request.arguments).await
    }

    /// Run one tool call to completion.
    pub async fn invoke(&self, tool_name: &str, arguments: Map<String, Value>) -> InvocationResult {
        let span = info_span!(
            "wick.tool.invoke",
            tool.name = %tool_name,
            tool.outcome = tracing::field::Empty,
        );

        let result = self.run(tool_name, arguments).instrument(span.clone()).await;

        span.record("tool.outcome", result.outcome());
        span.in_scope(|| match &result {
            InvocationResult::Success { .. } => {
                debug!(state = ?InvocationState::Succeeded, "tool call finished")
            }
            InvocationResult::Failure { kind, message } => {
                warn!(state = ?InvocationState::Failed, %kind, %message, "tool call failed")
            }
        });
        result
    }

    async fn run(&self, tool_name: &str, arguments: Map<String, Value>) -> InvocationResult {
        debug!(state = ?InvocationState::Received);

        let tool = match self.registry.lookup(tool_name) {
            Ok(tool) => tool,
            Err(e) => return InvocationResult::failure(ErrorKind::UnknownTool, e.to_string()),
        };

        let arguments = match tool.descriptor.arguments.validate(arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                return InvocationResult::failure(
                    ErrorKind::InvalidArgument,
                    format!("{}: {}", tool_name, e),
                )
            }
        };
        debug!(state = ?InvocationState::Validated);

        let adapter = tool.adapter();
        let host = Arc::clone(&self.host);
        let span = Span::current();

        debug!(state = ?InvocationState::Executing);
        let joined =
            tokio::task::spawn_blocking(move || span.in_scope(|| adapter(&host, &arguments))).await;

        match joined {
            Ok(Ok(document)) => InvocationResult::success(document),
            Ok(Err(e)) => InvocationResult::failure(e.kind(), e.to_string()),
            Err(e) if e.is_panic() => InvocationResult::failure(
                ErrorKind::AdapterError,
                format!("{} panicked: {}", tool_name, panic_message(e.into_panic())),
            ),
            Err(e) => InvocationResult::failure(
                ErrorKind::AdapterError,
                format!("{} did not complete: {}", tool_name, e),
            ),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterError;
    use crate::arguments::{ArgSpec, ArgType};
    use crate::dotpath;
    use crate::registry::ToolDescriptor;

    struct Host {
        settings: Value,
    }

    fn invoker() -> Invoker<Host> {
        let mut registry = Registry::new();
        registry
            .register(
                ToolDescriptor::new("get_setting", "Read a setting")
                    .with_argument(ArgSpec::required("path", ArgType::String)),
                |host: &Host, args| {
                    let path = args.str("path")?;
                    let value = dotpath::resolve(&host.settings, path)?;
                    Ok(json!({ "path": path, "value": value }))
                },
            )
            .unwrap();
        registry
            .register(ToolDescriptor::new("broken", "Always panics"), |_: &Host, _| {
                panic!("boom")
            })
            .unwrap();
        registry
            .register(ToolDescriptor::new("offline", "No database"), |_: &Host, _| {
                Err(AdapterError::unavailable("no database connection configured"))
            })
            .unwrap();

        let host = Host {
            settings: json!({ "DATABASES": { "default": { "ENGINE": "x" } } }),
        };
        Invoker::new(Arc::new(registry), Arc::new(host))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = invoker().invoke("nonexistent_tool", Map::new()).await;
        assert_eq!(result.kind(), Some(ErrorKind::UnknownTool));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let result = invoker().invoke("get_setting", Map::new()).await;
        assert_eq!(result.kind(), Some(ErrorKind::InvalidArgument));
    }

    #[tokio::test]
    async fn test_success_document() {
        let result = invoker()
            .invoke("get_setting", args(json!({ "path": "DATABASES.default.ENGINE" })))
            .await;
        assert_eq!(result.document().unwrap()["value"], "x");
    }

    #[tokio::test]
    async fn test_path_not_found_kind() {
        let result = invoker()
            .invoke("get_setting", args(json!({ "path": "DATABASES.default.MISSING" })))
            .await;

        match result {
            InvocationResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::PathNotFound);
                assert!(message.contains("DATABASES.default.MISSING"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adapter_panic_is_contained() {
        let invoker = invoker();
        let result = invoker.invoke("broken", Map::new()).await;

        assert_eq!(result.kind(), Some(ErrorKind::AdapterError));
        assert!(result.to_value()["message"].as_str().unwrap().contains("boom"));

        // Still serving afterwards.
        let again = invoker
            .invoke("get_setting", args(json!({ "path": "DATABASES" })))
            .await;
        assert!(again.is_success());
    }

    #[tokio::test]
    async fn test_unavailable_resource_is_adapter_error() {
        let result = invoker().invoke("offline", Map::new()).await;
        assert_eq!(result.kind(), Some(ErrorKind::AdapterError));
        assert_eq!(result.to_value()["message"], "no database connection configured");
    }

    #[tokio::test]
    async fn test_repeat_calls_are_equal() {
        let invoker = invoker();
        let request = InvocationRequest {
            tool_name: "get_setting".to_string(),
            arguments: args(json!({ "path": "DATABASES.default" })),
        };
        let first = invoker.invoke_request(request.clone()).await;
        let second = invoker.invoke_request(request).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_envelope_serialization() {
        let ok = serde_json::to_value(InvocationResult::success(json!([1, 2]))).unwrap();
        assert_eq!(ok, json!({ "status": "ok", "result": [1, 2] }));

        let err = InvocationResult::failure(ErrorKind::PathNotFound, "gone");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({ "status": "error", "kind": "path_not_found", "message": "gone" })
        );
        assert_eq!(serde_json::to_value(&err).unwrap(), err.to_value());
    }
}
