use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::document;
use crate::host::{HostContext, ModelDef};
use crate::types::ModelInfo;

#[tracing::instrument(name = "tool.list_models", skip_all)]
pub fn list_models(host: &HostContext, args: &Arguments) -> Result<Value, AdapterError> {
    let models = host.models.models()?;
    let app = args.opt_str("app")?;

    if let Some(app) = app {
        if !models.iter().any(|m| m.app == app) {
            return Err(AdapterError::invalid_argument(format!("unknown app '{app}'")));
        }
    }

    let listed: Vec<ModelInfo> = models
        .iter()
        .filter(|m| app.map_or(true, |app| m.app == app))
        .map(ModelDef::info)
        .collect();
    document(&listed)
}
