use std::collections::BTreeMap;

use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::document;
use crate::host::HostContext;
use crate::types::CommandInfo;

/// Built-in commands from the manifest plus project commands on disk. A
/// project command shadows a built-in of the same name.
#[tracing::instrument(name = "tool.list_management_commands", skip_all)]
pub fn list_management_commands(host: &HostContext, _args: &Arguments) -> Result<Value, AdapterError> {
    let mut by_name: BTreeMap<String, String> = BTreeMap::new();
    for (app, names) in &host.framework.commands {
        for name in names {
            by_name.insert(name.clone(), app.clone());
        }
    }
    for file in host.project.command_files()? {
        by_name.insert(file.name, file.app);
    }

    let listed: Vec<CommandInfo> = by_name
        .into_iter()
        .map(|(name, source_app)| CommandInfo { name, source_app })
        .collect();
    document(&listed)
}
