//! Configuration loading for Lantern.
//!
//! # Config File Locations
//!
//! Files are merged in order (later wins, key by key):
//! 1. `/etc/lantern/config.toml` (system)
//! 2. `~/.config/lantern/config.toml` (user)
//! 3. `./lantern.toml`, or the path given with `--config`
//! 4. Environment variables (`LANTERN_*`)
//!
//! # Example Config
//!
//! ```toml
//! [project]
//! root = "~/src/shop"
//! manifest = "lantern-manifest.toml"
//!
//! [settings]
//! file = "settings.json"
//!
//! [database]
//! path = "db.sqlite3"
//!
//! [logs]
//! file = "logs/app.log"
//!
//! [bind]
//! http_port = 8765
//!
//! [telemetry]
//! log_level = "info"
//! otlp_endpoint = "127.0.0.1:4317"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, expand_path, ConfigSources};
pub use sections::{
    BindConfig, DatabaseConfig, LogsConfig, ProjectConfig, QueryConfig, SettingsConfig,
    TelemetryConfig,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Complete Lantern configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanternConfig {
    pub project: ProjectConfig,
    pub settings: SettingsConfig,
    pub database: DatabaseConfig,
    pub logs: LogsConfig,
    pub query: QueryConfig,
    pub bind: BindConfig,
    pub telemetry: TelemetryConfig,
}

impl LanternConfig {
    /// Load from the standard locations and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`load`](Self::load), with `config_path` replacing `./lantern.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path)?;
        Self::load_layers(&files, |key| std::env::var(key).ok())
    }

    /// Merge `files` in order, then apply overrides from `env`.
    pub fn load_layers<F>(files: &[PathBuf], env: F) -> Result<(Self, ConfigSources), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let layer = loader::load_table(path)?;
            loader::merge_tables(&mut merged, layer);
            sources.files.push(path.clone());
        }

        let mut config: LanternConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: files.last().cloned().unwrap_or_default(),
                message: e.to_string(),
            })?;

        loader::apply_env_overrides(&mut config, &mut sources, env);
        config.expand_paths();
        config.validate()?;

        Ok((config, sources))
    }

    fn expand_paths(&mut self) {
        fn expand(path: &mut PathBuf) {
            *path = expand_path(&path.to_string_lossy());
        }
        fn expand_opt(path: &mut Option<PathBuf>) {
            if let Some(p) = path {
                expand(p);
            }
        }

        expand(&mut self.project.root);
        expand_opt(&mut self.project.manifest);
        expand_opt(&mut self.settings.file);
        expand_opt(&mut self.database.path);
        expand_opt(&mut self.logs.file);
    }

    /// Reject limits no request could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, default, max) in [
            ("logs", self.logs.default_limit, self.logs.max_limit),
            ("query", self.query.default_limit, self.query.max_limit),
        ] {
            if max < 1 {
                return Err(ConfigError::Invalid(format!("{}.max_limit must be at least 1", section)));
            }
            if default < 1 || default > max {
                return Err(ConfigError::Invalid(format!(
                    "{}.default_limit must be between 1 and {}.max_limit ({})",
                    section, section, max
                )));
            }
        }
        if self.logs.max_scan_bytes == 0 {
            return Err(ConfigError::Invalid("logs.max_scan_bytes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn manifest_path(&self) -> Option<PathBuf> {
        self.project.manifest.as_deref().map(|p| self.project.resolve(p))
    }

    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings.file.as_deref().map(|p| self.project.resolve(p))
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.path.as_deref().map(|p| self.project.resolve(p))
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.logs.file.as_deref().map(|p| self.project.resolve(p))
    }

    /// Serialize the effective config as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(format!("# Lantern Configuration\n\n{}", body))
    }
}
