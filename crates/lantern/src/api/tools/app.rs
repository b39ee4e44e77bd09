//! `application_info` and `get_setting`.

use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::document;
use crate::host::HostContext;
use crate::types::{ApplicationInfo, SettingValue};

#[tracing::instrument(name = "tool.application_info", skip_all)]
pub fn application_info(host: &HostContext, _args: &Arguments) -> Result<Value, AdapterError> {
    let settings = host.settings.document()?;

    let engine = wick::resolve(settings, "DATABASES.default.ENGINE")
        .ok()
        .and_then(Value::as_str)
        .and_then(|engine| engine.rsplit('.').next())
        .filter(|last| !last.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let info = ApplicationInfo {
        framework: host.framework.name.clone(),
        framework_version: host.framework.version.clone(),
        runtime_version: host.framework.runtime.clone(),
        installed_apps: string_list(settings, "INSTALLED_APPS"),
        middleware: string_list(settings, "MIDDLEWARE"),
        database_engine: engine,
        models_count: host.models.models().map(|m| m.len()).unwrap_or(0),
        debug: settings.get("DEBUG").and_then(Value::as_bool).unwrap_or(false),
    };
    document(&info)
}

#[tracing::instrument(name = "tool.get_setting", skip_all)]
pub fn get_setting(host: &HostContext, args: &Arguments) -> Result<Value, AdapterError> {
    let path = args.str("path")?;
    let settings = host.settings.document()?;
    let value = wick::resolve(settings, path)?;

    document(&SettingValue {
        path: path.to_string(),
        value: value.clone(),
    })
}

fn string_list(settings: &Value, key: &str) -> Vec<String> {
    settings
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
