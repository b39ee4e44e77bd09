//! Configuration sections. Every field has a serde default so a partial file
//! (or none at all) yields a usable config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The project being introspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root of the project tree; relative paths elsewhere resolve against it.
    pub root: PathBuf,

    /// Project manifest (TOML): framework info, models, URL tree.
    pub manifest: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            manifest: None,
        }
    }
}

impl ProjectConfig {
    /// Resolve `path` against the project root unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Settings document and redaction rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Settings file, TOML or JSON by extension.
    pub file: Option<PathBuf>,

    /// Keys containing any of these (case-insensitive) are masked.
    pub redact: Vec<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            file: None,
            redact: ["SECRET", "PASSWORD", "TOKEN", "API_KEY"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// SQLite database, opened read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,

    /// Table recording applied migrations.
    pub migrations_table: String,

    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            migrations_table: "django_migrations".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Application log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    pub file: Option<PathBuf>,

    /// At most this many bytes are read from the end of the file.
    pub max_scan_bytes: u64,

    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            file: None,
            max_scan_bytes: 1024 * 1024,
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

/// Row limits for `query_model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

/// Network bind address for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    pub host: String,
    pub http_port: u16,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: 8765,
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// EnvFilter directive used when RUST_LOG is unset.
    pub log_level: String,

    /// OTLP gRPC endpoint; traces are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}
