//! lantern - read-only project introspection over MCP.

pub mod api;
pub mod host;
pub mod server;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use wick::{Invoker, McpState};

use crate::api::{build_registry, LanternHandler};
use crate::host::HostContext;

/// Assemble the MCP state: catalog, host context and handler.
pub fn build_state(host: HostContext) -> Result<Arc<McpState<LanternHandler>>, wick::RegistryError> {
    let registry = build_registry(&host.limits)?;
    let invoker = Invoker::new(Arc::new(registry), Arc::new(host));
    Ok(Arc::new(McpState::new(LanternHandler::new(invoker))))
}
