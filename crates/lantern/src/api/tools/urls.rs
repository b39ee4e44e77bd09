use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::document;
use crate::host::HostContext;

#[tracing::instrument(name = "tool.list_urls", skip_all)]
pub fn list_urls(host: &HostContext, _args: &Arguments) -> Result<Value, AdapterError> {
    document(&host.routes.routes()?)
}
