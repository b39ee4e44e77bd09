//! Settings document loaded from a TOML or JSON file.

use std::path::Path;

use serde_json::{Map, Value};
use wick::AdapterError;

use super::{HostError, SettingsSource};

/// Replacement for redacted values.
pub const REDACTED: &str = "********";

/// A settings document with secrets already masked.
#[derive(Debug, Clone)]
pub struct SettingsDocument {
    root: Value,
}

impl SettingsDocument {
    /// Load and redact. `.json` files parse as JSON, anything else as TOML.
    pub fn load(path: &Path, redact: &[String]) -> Result<Self, HostError> {
        let content = std::fs::read_to_string(path).map_err(|source| HostError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let root = if is_json {
            serde_json::from_str(&content).map_err(|e| HostError::Settings {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            let table: toml::Table = toml::from_str(&content).map_err(|e| HostError::Settings {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            toml_to_json(toml::Value::Table(table))
        };

        if !root.is_object() {
            return Err(HostError::Settings {
                path: path.to_path_buf(),
                message: "top level must be a table of settings".to_string(),
            });
        }

        Ok(Self::from_value(root, redact))
    }

    pub fn from_value(mut root: Value, redact: &[String]) -> Self {
        let patterns: Vec<String> = redact.iter().map(|p| p.to_ascii_uppercase()).collect();
        redact_in_place(&mut root, &patterns);
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl SettingsSource for SettingsDocument {
    fn document(&self) -> Result<&Value, AdapterError> {
        Ok(&self.root)
    }
}

fn is_sensitive(key: &str, patterns: &[String]) -> bool {
    let upper = key.to_ascii_uppercase();
    patterns.iter().any(|p| upper.contains(p.as_str()))
}

fn redact_in_place(value: &mut Value, patterns: &[String]) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if is_sensitive(key, patterns) {
                    *child = Value::String(REDACTED.to_string());
                } else {
                    redact_in_place(child, patterns);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_in_place(item, patterns);
            }
        }
        _ => {}
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn redact() -> Vec<String> {
        vec!["SECRET".into(), "PASSWORD".into(), "TOKEN".into(), "API_KEY".into()]
    }

    #[test]
    fn test_toml_settings_are_redacted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
SECRET_KEY = "hunter2"
DEBUG = true
STARTED = 2024-01-02T03:04:05Z

[DATABASES.default]
ENGINE = "django.db.backends.sqlite3"
PASSWORD = "pw"
"#,
        )
        .unwrap();

        let doc = SettingsDocument::load(&path, &redact()).unwrap();
        let root = doc.root();
        assert_eq!(root["SECRET_KEY"], json!(REDACTED));
        assert_eq!(root["DATABASES"]["default"]["PASSWORD"], json!(REDACTED));
        assert_eq!(root["DATABASES"]["default"]["ENGINE"], json!("django.db.backends.sqlite3"));
        assert_eq!(root["DEBUG"], json!(true));
        assert_eq!(root["STARTED"], json!("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_redaction_is_case_insensitive_and_nested_in_arrays() {
        let doc = SettingsDocument::from_value(
            json!({"services": [{"api_key": "abc", "url": "http://x"}]}),
            &redact(),
        );
        assert_eq!(doc.root()["services"][0]["api_key"], json!(REDACTED));
        assert_eq!(doc.root()["services"][0]["url"], json!("http://x"));
    }

    #[test]
    fn test_json_top_level_must_be_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = SettingsDocument::load(&path, &redact()).unwrap_err();
        assert!(matches!(err, HostError::Settings { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = SettingsDocument::load(Path::new("/nonexistent/settings.toml"), &[]).unwrap_err();
        assert!(matches!(err, HostError::Read { .. }));
    }
}
