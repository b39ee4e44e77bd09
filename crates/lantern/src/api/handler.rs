//! MCP Handler implementation for lantern
//!
//! Wraps the tool [`Invoker`] and implements wick::Handler.

use async_trait::async_trait;
use serde_json::{Map, Value};
use wick::{CallToolResult, ErrorData, Handler, Implementation, Invoker, Tool};

use crate::host::HostContext;

const INSTRUCTIONS: &str = "Lantern exposes read-only introspection of a web application project: \
settings, models, URL routes, database schema, migrations, management commands and recent logs. \
Every tool returns {\"status\":\"ok\",\"result\":...} or {\"status\":\"error\",\"kind\":...,\"message\":...}. \
Nothing here modifies the project.";

pub struct LanternHandler {
    pub invoker: Invoker<HostContext>,
}

impl LanternHandler {
    pub fn new(invoker: Invoker<HostContext>) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl Handler for LanternHandler {
    fn tools(&self) -> Vec<Tool> {
        self.invoker.registry().tools()
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::from(self.invoker.invoke(name, arguments).await))
    }

    fn server_info(&self) -> Implementation {
        Implementation::new("lantern", env!("CARGO_PKG_VERSION")).with_title("Lantern")
    }

    fn instructions(&self) -> Option<String> {
        Some(INSTRUCTIONS.to_string())
    }
}
