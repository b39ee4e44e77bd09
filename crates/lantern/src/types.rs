//! Documents returned by the introspection tools.
//!
//! Each derives `JsonSchema` so tools/list can advertise the result shape.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationInfo {
    pub framework: String,
    pub framework_version: String,
    pub runtime_version: String,
    pub installed_apps: Vec<String>,
    pub middleware: Vec<String>,
    /// Last dotted component of `DATABASES.default.ENGINE`.
    pub database_engine: String,
    pub models_count: usize,
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SettingValue {
    pub path: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    pub app: String,
    pub name: String,
    pub table_name: String,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub max_length: Option<u32>,
    pub nullable: bool,
    pub is_relation: bool,
    pub related_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UrlInfo {
    /// Namespaced route name (`ns:name`), if the route is named.
    pub name: Option<String>,
    /// Full pattern including every enclosing include prefix.
    pub pattern: String,
    pub view_handler: Option<String>,
    /// Full prefix of the enclosing include; `None` at top level.
    pub included_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub references_table: String,
    /// `None` when the key references the target's primary key implicitly.
    pub references_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct MigrationInfo {
    pub app: String,
    pub migration_name: String,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandInfo {
    pub name: String,
    pub source_app: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    /// First line plus any continuation lines (tracebacks).
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryPage {
    pub app: String,
    pub model: String,
    pub total_count: u64,
    pub returned_count: usize,
    pub limit: i64,
    pub filters: Map<String, Value>,
    pub order_by: Vec<String>,
    pub results: Vec<Map<String, Value>>,
}
