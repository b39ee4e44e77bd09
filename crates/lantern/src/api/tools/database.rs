use serde_json::Value;
use wick::{AdapterError, Arguments};

use super::document;
use crate::host::HostContext;
use crate::types::TableSchema;

/// One table when `table` is given, otherwise every user table by name.
#[tracing::instrument(name = "tool.database_schema", skip_all)]
pub fn database_schema(host: &HostContext, args: &Arguments) -> Result<Value, AdapterError> {
    let schemas: Vec<TableSchema> = match args.opt_str("table")? {
        Some(table) => vec![host.schema.describe(table)?],
        None => host
            .schema
            .tables()?
            .iter()
            .map(|t| host.schema.describe(t))
            .collect::<Result<_, _>>()?,
    };
    document(&schemas)
}
