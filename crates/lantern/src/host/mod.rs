//! Host context: everything adapters may read about the project.
//!
//! Built once at startup from configuration and shared read-only. Each
//! information domain sits behind a narrow trait so tools never touch files
//! or connections directly, and so tests can substitute fixtures.

pub mod database;
pub mod logs;
pub mod manifest;
pub mod project;
pub mod settings;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use lanternconf::LanternConfig;
use serde_json::{Map, Value};
use thiserror::Error;
use wick::AdapterError;

use crate::types::{LogEntry, TableSchema, UrlInfo};
pub use database::{RowPage, RowQuery, SqliteDatabase};
pub use logs::LogFile;
pub use manifest::{FieldDef, FrameworkInfo, Manifest, ModelDef, UrlDef};
pub use project::{ProjectFile, ProjectTree};
pub use settings::SettingsDocument;

/// Startup failures reading host configuration.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    Settings { path: PathBuf, message: String },

    #[error("Invalid project manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Database {path} is not usable: {message}")]
    Database { path: PathBuf, message: String },
}

pub trait SettingsSource: Send + Sync {
    /// The redacted settings document.
    fn document(&self) -> Result<&Value, AdapterError>;
}

pub trait ModelCatalog: Send + Sync {
    fn models(&self) -> Result<&[ModelDef], AdapterError>;
}

pub trait RouteTable: Send + Sync {
    /// Routes with includes flattened, in declaration order.
    fn routes(&self) -> Result<Vec<UrlInfo>, AdapterError>;
}

pub trait SchemaInspector: Send + Sync {
    /// User tables, sorted by name.
    fn tables(&self) -> Result<Vec<String>, AdapterError>;

    fn describe(&self, table: &str) -> Result<TableSchema, AdapterError>;
}

pub trait RowSource: Send + Sync {
    fn query(&self, query: &RowQuery) -> Result<RowPage, AdapterError>;
}

pub trait MigrationLedger: Send + Sync {
    /// `(app, name)` pairs recorded as applied.
    fn applied(&self) -> Result<HashSet<(String, String)>, AdapterError>;
}

pub trait CommandIndex: Send + Sync {
    /// Migration files found on disk, sorted by app then name.
    fn migration_files(&self) -> Result<Vec<ProjectFile>, AdapterError>;

    /// Management command files found on disk, sorted by name.
    fn command_files(&self) -> Result<Vec<ProjectFile>, AdapterError>;
}

pub trait LogSource: Send + Sync {
    /// Parsed entries, most recent first.
    fn entries(&self) -> Result<Vec<LogEntry>, AdapterError>;
}

/// Default and maximum `limit` for the bounded tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub logs_default: i64,
    pub logs_max: i64,
    pub query_default: i64,
    pub query_max: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            logs_default: 100,
            logs_max: 1000,
            query_default: 100,
            query_max: 1000,
        }
    }
}

impl From<&LanternConfig> for Limits {
    fn from(config: &LanternConfig) -> Self {
        Self {
            logs_default: config.logs.default_limit,
            logs_max: config.logs.max_limit,
            query_default: config.query.default_limit,
            query_max: config.query.max_limit,
        }
    }
}

/// The explicitly passed host context handed to every adapter.
pub struct HostContext {
    pub framework: FrameworkInfo,
    pub settings: Arc<dyn SettingsSource>,
    pub models: Arc<dyn ModelCatalog>,
    pub routes: Arc<dyn RouteTable>,
    pub schema: Arc<dyn SchemaInspector>,
    pub rows: Arc<dyn RowSource>,
    pub migrations: Arc<dyn MigrationLedger>,
    pub project: Arc<dyn CommandIndex>,
    pub logs: Arc<dyn LogSource>,
    pub limits: Limits,
}

impl HostContext {
    /// A context where every source reports itself as not configured.
    pub fn unconfigured() -> Self {
        Self {
            framework: FrameworkInfo::default(),
            settings: Arc::new(Unconfigured("settings file")),
            models: Arc::new(Unconfigured("project manifest")),
            routes: Arc::new(Unconfigured("project manifest")),
            schema: Arc::new(Unconfigured("database connection")),
            rows: Arc::new(Unconfigured("database connection")),
            migrations: Arc::new(Unconfigured("database connection")),
            project: Arc::new(Unconfigured("project root")),
            logs: Arc::new(Unconfigured("log file")),
            limits: Limits::default(),
        }
    }

    /// Build from configuration. Settings and manifest files are read and
    /// validated here so a broken project fails startup, not the first call.
    pub fn from_config(config: &LanternConfig) -> Result<Self, HostError> {
        let mut host = Self::unconfigured();
        host.limits = Limits::from(config);

        if let Some(path) = config.settings_path() {
            let settings = SettingsDocument::load(&path, &config.settings.redact)?;
            tracing::info!(path = %path.display(), "Loaded settings");
            host.settings = Arc::new(settings);
        }

        if let Some(path) = config.manifest_path() {
            let manifest = Arc::new(Manifest::load(&path)?);
            tracing::info!(
                path = %path.display(),
                models = manifest.models.len(),
                "Loaded project manifest"
            );
            host.framework = manifest.framework.clone();
            host.models = manifest.clone();
            host.routes = manifest;
        }

        if let Some(path) = config.database_path() {
            let database = Arc::new(SqliteDatabase::open(
                &path,
                &config.database.migrations_table,
                config.database.busy_timeout_ms,
            )?);
            tracing::info!(path = %path.display(), "Using database");
            host.schema = database.clone();
            host.rows = database.clone();
            host.migrations = database;
        }

        host.project = Arc::new(ProjectTree::new(&config.project.root));

        if let Some(path) = config.log_path() {
            host.logs = Arc::new(LogFile::new(path, config.logs.max_scan_bytes));
        }

        Ok(host)
    }
}

/// Stand-in for a source the configuration does not provide.
struct Unconfigured(&'static str);

impl Unconfigured {
    fn error(&self) -> AdapterError {
        AdapterError::unavailable(format!("no {} configured", self.0))
    }
}

impl SettingsSource for Unconfigured {
    fn document(&self) -> Result<&Value, AdapterError> {
        Err(self.error())
    }
}

impl ModelCatalog for Unconfigured {
    fn models(&self) -> Result<&[ModelDef], AdapterError> {
        Err(self.error())
    }
}

impl RouteTable for Unconfigured {
    fn routes(&self) -> Result<Vec<UrlInfo>, AdapterError> {
        Err(self.error())
    }
}

impl SchemaInspector for Unconfigured {
    fn tables(&self) -> Result<Vec<String>, AdapterError> {
        Err(self.error())
    }

    fn describe(&self, _table: &str) -> Result<TableSchema, AdapterError> {
        Err(self.error())
    }
}

impl RowSource for Unconfigured {
    fn query(&self, _query: &RowQuery) -> Result<RowPage, AdapterError> {
        Err(self.error())
    }
}

impl MigrationLedger for Unconfigured {
    fn applied(&self) -> Result<HashSet<(String, String)>, AdapterError> {
        Err(self.error())
    }
}

impl CommandIndex for Unconfigured {
    fn migration_files(&self) -> Result<Vec<ProjectFile>, AdapterError> {
        Err(self.error())
    }

    fn command_files(&self) -> Result<Vec<ProjectFile>, AdapterError> {
        Err(self.error())
    }
}

impl LogSource for Unconfigured {
    fn entries(&self) -> Result<Vec<LogEntry>, AdapterError> {
        Err(self.error())
    }
}

/// Row returned from a query, keyed by column name.
pub type Row = Map<String, Value>;
