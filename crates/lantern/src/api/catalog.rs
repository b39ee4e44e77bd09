//! The static tool catalog. Registration order is the advertised order.

use serde_json::json;
use wick::{schema_for, ArgSpec, ArgType, Registry, RegistryError, ToolDescriptor};

use super::tools;
use crate::host::{HostContext, Limits};
use crate::types::{
    ApplicationInfo, CommandInfo, LogEntry, MigrationInfo, ModelInfo, QueryPage, SettingValue,
    TableSchema, UrlInfo,
};

pub fn build_registry(limits: &Limits) -> Result<Registry<HostContext>, RegistryError> {
    let mut registry = Registry::new();

    registry.register(
        ToolDescriptor::new(
            "application_info",
            "Framework and runtime versions, installed apps, middleware, database engine and debug flag",
        )
        .with_output_schema(schema_for::<ApplicationInfo>()),
        tools::app::application_info,
    )?;

    registry.register(
        ToolDescriptor::new("get_setting", "Read one setting by dot-separated path, e.g. DATABASES.default.ENGINE")
            .with_argument(
                ArgSpec::required("path", ArgType::String)
                    .describe("Dot-separated path; numeric segments index into lists"),
            )
            .with_output_schema(schema_for::<SettingValue>()),
        tools::app::get_setting,
    )?;

    registry.register(
        ToolDescriptor::new("list_models", "Models with their table names and fields")
            .with_argument(ArgSpec::optional("app", ArgType::String).describe("Only models of this app label"))
            .with_output_schema(schema_for::<Vec<ModelInfo>>()),
        tools::models::list_models,
    )?;

    registry.register(
        ToolDescriptor::new("list_urls", "URL routes with includes flattened into full patterns")
            .with_output_schema(schema_for::<Vec<UrlInfo>>()),
        tools::urls::list_urls,
    )?;

    registry.register(
        ToolDescriptor::new("database_schema", "Columns, indexes and foreign keys of database tables")
            .with_argument(ArgSpec::optional("table", ArgType::String).describe("Describe only this table"))
            .with_output_schema(schema_for::<Vec<TableSchema>>()),
        tools::database::database_schema,
    )?;

    registry.register(
        ToolDescriptor::new("list_migrations", "Migrations found in the project and whether each is applied")
            .with_argument(ArgSpec::optional("app", ArgType::String).describe("Only migrations of this app label"))
            .with_output_schema(schema_for::<Vec<MigrationInfo>>()),
        tools::migrations::list_migrations,
    )?;

    registry.register(
        ToolDescriptor::new("list_management_commands", "Available management commands and the app providing each")
            .with_output_schema(schema_for::<Vec<CommandInfo>>()),
        tools::commands::list_management_commands,
    )?;

    registry.register(
        ToolDescriptor::new("read_recent_logs", "Recent log entries, most recent first")
            .with_argument(
                ArgSpec::optional("level_filter", ArgType::String)
                    .describe("Only entries at this level: DEBUG, INFO, WARNING, ERROR or CRITICAL"),
            )
            .with_argument(
                ArgSpec::optional("limit", ArgType::Integer)
                    .with_default(json!(limits.logs_default))
                    .describe(format!("Maximum entries to return (at most {})", limits.logs_max)),
            )
            .with_output_schema(schema_for::<Vec<LogEntry>>()),
        tools::logs::read_recent_logs,
    )?;

    registry.register(
        ToolDescriptor::new("query_model", "Read rows of a model's table with equality filters and ordering")
            .with_argument(ArgSpec::required("app_label", ArgType::String).describe("App label, e.g. blog"))
            .with_argument(ArgSpec::required("model_name", ArgType::String).describe("Model name, e.g. Post"))
            .with_argument(
                ArgSpec::optional("filters", ArgType::Object)
                    .describe("Field name to value; all must match exactly"),
            )
            .with_argument(
                ArgSpec::optional("order_by", ArgType::Array)
                    .describe("Field names, prefix with '-' for descending"),
            )
            .with_argument(
                ArgSpec::optional("limit", ArgType::Integer)
                    .with_default(json!(limits.query_default))
                    .describe(format!("Maximum rows to return (at most {})", limits.query_max)),
            )
            .with_output_schema(schema_for::<QueryPage>()),
        tools::query::query_model,
    )?;

    Ok(registry)
}
