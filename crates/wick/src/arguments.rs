//! Argument schemas and validation.
//!
//! Every tool declares an ordered [`ArgumentSchema`]. The invoker validates
//! raw call arguments against it before an adapter runs, so adapters only
//! ever see [`Arguments`] that passed presence and type checks with defaults
//! filled in.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::adapter::AdapterError;
use crate::registry::RegistryError;
use crate::types::tool::ToolSchema;

/// JSON type an argument must conform to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    /// Any number with an integral value.
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Integer => "integer",
            ArgType::Number => "number",
            ArgType::Boolean => "boolean",
            ArgType::Array => "array",
            ArgType::Object => "object",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ArgType::String, Value::String(_)) => true,
            (ArgType::Integer, Value::Number(n)) => integral(n).is_some(),
            (ArgType::Number, Value::Number(_)) => true,
            (ArgType::Boolean, Value::Bool(_)) => true,
            (ArgType::Array, Value::Array(_)) => true,
            (ArgType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ArgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integers must fit in `i64`; integral floats in range are normalized.
fn integral(n: &serde_json::Number) -> Option<Value> {
    if n.is_i64() {
        return Some(Value::Number(n.clone()));
    }
    if !n.is_f64() {
        return None;
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| json!(f as i64))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(_) => "out-of-range integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl ArgSpec {
    pub fn required(name: impl Into<String>, kind: ArgType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ArgType) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Default applied when the argument is absent or null.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Why a call's arguments were rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgumentError {
    #[error("unknown argument '{0}'")]
    Unknown(String),

    #[error("missing required argument '{0}'")]
    Missing(String),

    #[error("argument '{name}' must be of type {expected}, got {found}")]
    WrongType {
        name: String,
        expected: ArgType,
        found: &'static str,
    },
}

/// Ordered argument declarations for one tool.
#[derive(Debug, Clone, Default)]
pub struct ArgumentSchema {
    specs: Vec<ArgSpec>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ArgSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Startup-time sanity check of the declarations themselves.
    pub fn check(&self, tool: &str) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for spec in &self.specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(RegistryError::DuplicateArgument {
                    tool: tool.to_string(),
                    argument: spec.name.clone(),
                });
            }
            if let Some(default) = &spec.default {
                if !spec.kind.accepts(default) {
                    return Err(RegistryError::InvalidDefault {
                        tool: tool.to_string(),
                        argument: spec.name.clone(),
                        expected: spec.kind,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate raw call arguments.
    ///
    /// Unknown names are rejected first so a typo is reported as such rather
    /// than as a missing argument. Explicit `null` counts as absent.
    pub fn validate(&self, raw: Map<String, Value>) -> Result<Arguments, ArgumentError> {
        if let Some(unknown) = raw.keys().find(|k| self.get(k).is_none()) {
            return Err(ArgumentError::Unknown(unknown.clone()));
        }

        let mut raw = raw;
        let mut validated = Map::new();
        for spec in &self.specs {
            let value = raw.remove(&spec.name).filter(|v| !v.is_null());
            let value = match value {
                Some(value) => value,
                None => match (&spec.default, spec.required) {
                    (Some(default), _) => default.clone(),
                    (None, true) => return Err(ArgumentError::Missing(spec.name.clone())),
                    (None, false) => continue,
                },
            };

            if !spec.kind.accepts(&value) {
                return Err(ArgumentError::WrongType {
                    name: spec.name.clone(),
                    expected: spec.kind,
                    found: json_type_name(&value),
                });
            }

            let value = match (spec.kind, &value) {
                (ArgType::Integer, Value::Number(n)) => integral(n).unwrap_or(value),
                _ => value,
            };
            validated.insert(spec.name.clone(), value);
        }

        Ok(Arguments(validated))
    }

    /// Render as the MCP `inputSchema`.
    pub fn to_tool_schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for spec in &self.specs {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(spec.kind.as_str()));
            if let Some(description) = &spec.description {
                property.insert("description".to_string(), json!(description));
            }
            if let Some(default) = &spec.default {
                property.insert("default".to_string(), default.clone());
            }
            properties.insert(spec.name.clone(), Value::Object(property));

            if spec.required {
                required.push(spec.name.clone());
            }
        }

        ToolSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: if required.is_empty() { None } else { Some(required) },
            additional_properties: Some(false),
        }
    }
}

/// Validated arguments handed to an adapter.
///
/// Accessor failures mean the adapter asked for something its own schema
/// does not guarantee; they surface as `InvalidArgument`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn str(&self, name: &str) -> Result<&str, AdapterError> {
        self.opt_str(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, AdapterError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_type(name, ArgType::String, other)),
        }
    }

    pub fn i64(&self, name: &str) -> Result<i64, AdapterError> {
        self.opt_i64(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_i64(&self, name: &str) -> Result<Option<i64>, AdapterError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| wrong_type(name, ArgType::Integer, value)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, AdapterError> {
        self.opt_bool(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>, AdapterError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(wrong_type(name, ArgType::Boolean, other)),
        }
    }

    /// An optional object argument; absent yields `None`.
    pub fn object(&self, name: &str) -> Result<Option<&Map<String, Value>>, AdapterError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(wrong_type(name, ArgType::Object, other)),
        }
    }

    /// An optional array of strings; absent yields an empty list.
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, AdapterError> {
        match self.0.get(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        AdapterError::invalid_argument(format!(
                            "argument '{}' must contain only strings",
                            name
                        ))
                    })
                })
                .collect(),
            Some(other) => Err(wrong_type(name, ArgType::Array, other)),
        }
    }

    /// Deserialize the whole argument map into a typed struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, AdapterError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| AdapterError::invalid_argument(format!("invalid arguments: {}", e)))
    }
}

fn missing(name: &str) -> AdapterError {
    AdapterError::invalid_argument(ArgumentError::Missing(name.to_string()).to_string())
}

fn wrong_type(name: &str, expected: ArgType, found: &Value) -> AdapterError {
    AdapterError::invalid_argument(
        ArgumentError::WrongType {
            name: name.to_string(),
            expected,
            found: json_type_name(found),
        }
        .to_string(),
    )
}
