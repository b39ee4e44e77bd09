//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, LanternConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// Returns existing paths in load order (system, user, local or CLI). An
/// explicit `cli_path` that does not exist is an error rather than silently
/// skipped.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/lantern/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("lantern/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    match cli_path {
        Some(path) if path.exists() => files.push(path.to_path_buf()),
        Some(path) => {
            return Err(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            })
        }
        None => {
            let local = PathBuf::from("lantern.toml");
            if local.exists() {
                files.push(local);
            }
        }
    }

    Ok(files)
}

/// Read one config file as a raw TOML table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Merge `overlay` into `base`. Nested tables merge recursively; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides. `env` looks a variable up.
pub fn apply_env_overrides<F>(config: &mut LanternConfig, sources: &mut ConfigSources, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();

    // Project paths
    if let Some(v) = env("LANTERN_PROJECT_ROOT") {
        config.project.root = PathBuf::from(v);
        applied.push("LANTERN_PROJECT_ROOT");
    }
    if let Some(v) = env("LANTERN_MANIFEST") {
        config.project.manifest = Some(PathBuf::from(v));
        applied.push("LANTERN_MANIFEST");
    }
    if let Some(v) = env("LANTERN_SETTINGS") {
        config.settings.file = Some(PathBuf::from(v));
        applied.push("LANTERN_SETTINGS");
    }
    if let Some(v) = env("LANTERN_DATABASE") {
        config.database.path = Some(PathBuf::from(v));
        applied.push("LANTERN_DATABASE");
    }
    if let Some(v) = env("LANTERN_LOG_FILE") {
        config.logs.file = Some(PathBuf::from(v));
        applied.push("LANTERN_LOG_FILE");
    }

    // Bind address
    if let Some(v) = env("LANTERN_BIND_HOST") {
        config.bind.host = v;
        applied.push("LANTERN_BIND_HOST");
    }
    if let Some(v) = env("LANTERN_HTTP_PORT") {
        if let Ok(port) = v.parse() {
            config.bind.http_port = port;
            applied.push("LANTERN_HTTP_PORT");
        }
    }

    // Telemetry
    if let Some(v) = env("LANTERN_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        applied.push("LANTERN_OTLP_ENDPOINT");
    }
    // Also support standard OTEL env var
    if let Some(v) = env("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.telemetry.otlp_endpoint = Some(v);
        applied.push("OTEL_EXPORTER_OTLP_ENDPOINT");
    }
    if let Some(v) = env("LANTERN_LOG_LEVEL") {
        config.telemetry.log_level = v;
        applied.push("LANTERN_LOG_LEVEL");
    }
    // Also support RUST_LOG
    if let Some(v) = env("RUST_LOG") {
        config.telemetry.log_level = v;
        applied.push("RUST_LOG");
    }

    sources
        .env_overrides
        .extend(applied.into_iter().map(String::from));
}

/// Expand a leading `~/` or `$VAR/` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        directories::BaseDirs::new()
            .map(|d| d.home_dir().join(stripped))
            .unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(stripped) = path.strip_prefix('$') {
        let (var_name, rest) = match stripped.find('/') {
            Some(slash) => (&stripped[..slash], Some(&stripped[slash + 1..])),
            None => (stripped, None),
        };
        match (env::var(var_name), rest) {
            (Ok(value), Some(rest)) => PathBuf::from(value).join(rest),
            (Ok(value), None) => PathBuf::from(value),
            (Err(_), _) => PathBuf::from(path),
        }
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().ends_with("test/path"));
    }

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
        assert_eq!(expand_path("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn test_missing_cli_path_is_error() {
        let err = discover_config_files_with_override(Some(Path::new("/nonexistent/lantern.toml")));
        assert!(matches!(err, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn test_merge_tables_recurses() {
        let mut base: toml::Table = "[logs]\nfile = \"a.log\"\nmax_limit = 10\n".parse().unwrap();
        let overlay: toml::Table = "[logs]\nmax_limit = 20\n[bind]\nhttp_port = 1\n".parse().unwrap();

        merge_tables(&mut base, overlay);

        assert_eq!(base["logs"]["file"].as_str(), Some("a.log"));
        assert_eq!(base["logs"]["max_limit"].as_integer(), Some(20));
        assert_eq!(base["bind"]["http_port"].as_integer(), Some(1));
    }

    #[test]
    fn test_unparseable_port_is_ignored() {
        let mut config = LanternConfig::default();
        let mut sources = ConfigSources::default();
        apply_env_overrides(&mut config, &mut sources, |k| {
            (k == "LANTERN_HTTP_PORT").then(|| "not-a-port".to_string())
        });

        assert_eq!(config.bind.http_port, 8765);
        assert!(sources.env_overrides.is_empty());
    }
}
