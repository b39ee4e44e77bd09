use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::document;
use crate::host::HostContext;
use crate::types::MigrationInfo;

/// Migrations on disk joined with the applied ledger.
#[tracing::instrument(name = "tool.list_migrations", skip_all)]
pub fn list_migrations(host: &HostContext, args: &Arguments) -> Result<Value, AdapterError> {
    let app = args.opt_str("app")?;
    let files = host.project.migration_files()?;

    if let Some(app) = app {
        if !files.iter().any(|f| f.app == app) {
            return Err(AdapterError::invalid_argument(format!(
                "no migrations found for app '{app}'"
            )));
        }
    }

    let applied = host.migrations.applied()?;
    let mut listed: Vec<MigrationInfo> = files
        .into_iter()
        .filter(|f| app.map_or(true, |app| f.app == app))
        .map(|f| {
            let is_applied = applied.contains(&(f.app.clone(), f.name.clone()));
            MigrationInfo {
                app: f.app,
                migration_name: f.name,
                applied: is_applied,
            }
        })
        .collect();
    listed.sort();
    document(&listed)
}
