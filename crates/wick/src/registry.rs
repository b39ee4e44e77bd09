//! Tool registry - the static catalog of read-only tools.
//!
//! Populated once at startup, then shared behind an `Arc`. There is no
//! removal: the advertised catalog is fixed for the life of the process.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::adapter::{Adapter, AdapterError};
use crate::arguments::{ArgSpec, ArgType, ArgumentSchema, Arguments};
use crate::types::tool::{Tool, ToolSchema};

/// Registration-time and lookup errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid tool name '{0}': use letters, digits, '_' or '-'")]
    InvalidName(String),

    #[error("tool '{tool}' declares argument '{argument}' more than once")]
    DuplicateArgument { tool: String, argument: String },

    #[error("tool '{tool}': default for '{argument}' is not of type {expected}")]
    InvalidDefault {
        tool: String,
        argument: String,
        expected: ArgType,
    },
}

/// What callers see of a tool: name, description and argument schema.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub arguments: ArgumentSchema,
    /// JSON Schema of the success document, advertised inside the envelope.
    pub output_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: ArgumentSchema::new(),
            output_schema: None,
        }
    }

    pub fn with_argument(mut self, spec: ArgSpec) -> Self {
        self.arguments = self.arguments.arg(spec);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Render for tools/list. Every tool here is read-only and idempotent.
    pub fn to_tool(&self) -> Tool {
        let tool = Tool::new(&self.name, &self.description)
            .with_input_schema(self.arguments.to_tool_schema())
            .read_only()
            .idempotent();

        match &self.output_schema {
            Some(schema) => tool.with_output_schema(ToolSchema::envelope(schema.clone())),
            None => tool,
        }
    }
}

/// A descriptor paired with its adapter.
pub struct RegisteredTool<C> {
    pub descriptor: ToolDescriptor,
    adapter: Adapter<C>,
}

impl<C> RegisteredTool<C> {
    /// A cheap handle to the adapter, movable onto the blocking pool.
    pub fn adapter(&self) -> Adapter<C> {
        Arc::clone(&self.adapter)
    }
}

impl<C> std::fmt::Debug for RegisteredTool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered tool catalog over host context `C`.
pub struct Registry<C> {
    tools: Vec<RegisteredTool<C>>,
    index: HashMap<String, usize>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Fails on a duplicate name or a malformed argument schema.
    pub fn register<F>(&mut self, descriptor: ToolDescriptor, adapter: F) -> Result<(), RegistryError>
    where
        F: Fn(&C, &Arguments) -> Result<Value, AdapterError> + Send + Sync + 'static,
    {
        if !valid_name(&descriptor.name) {
            return Err(RegistryError::InvalidName(descriptor.name));
        }
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }
        descriptor.arguments.check(&descriptor.name)?;

        tracing::debug!(tool = %descriptor.name, "registered tool");
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            adapter: Arc::new(adapter),
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool<C>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// Descriptors in registration order.
    pub fn list_all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor)
    }

    /// MCP tool definitions in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.list_all().map(ToolDescriptor::to_tool).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(_: &(), _: &Arguments) -> Result<Value, AdapterError> {
        Ok(Value::Null)
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry: Registry<()> = Registry::new();
        registry.register(ToolDescriptor::new("list_urls", "a"), noop).unwrap();

        let err = registry
            .register(ToolDescriptor::new("list_urls", "b"), noop)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("list_urls".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("list_urls").unwrap().descriptor.description, "a");
    }

    #[test]
    fn test_lookup_unknown() {
        let registry: Registry<()> = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.lookup("nope").unwrap_err(),
            RegistryError::UnknownTool("nope".to_string())
        );
    }

    #[test]
    fn test_list_all_keeps_registration_order() {
        let mut registry: Registry<()> = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(ToolDescriptor::new(name, name), noop).unwrap();
        }

        let first: Vec<_> = registry.list_all().map(|d| d.name.clone()).collect();
        let second: Vec<_> = registry.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(first, vec!["zeta", "alpha", "mid"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry: Registry<()> = Registry::new();
        for name in ["", "has space", "dotted.name"] {
            assert!(matches!(
                registry.register(ToolDescriptor::new(name, "x"), noop),
                Err(RegistryError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_schema_errors_surface_at_registration() {
        let mut registry: Registry<()> = Registry::new();
        let descriptor = ToolDescriptor::new("read_recent_logs", "x")
            .with_argument(ArgSpec::optional("limit", ArgType::Integer).with_default(json!("many")));

        assert!(matches!(
            registry.register(descriptor, noop),
            Err(RegistryError::InvalidDefault { .. })
        ));
        assert!(!registry.contains("read_recent_logs"));
    }

    #[test]
    fn test_to_tool_wraps_output_schema() {
        let tool = ToolDescriptor::new("list_models", "List models")
            .with_argument(ArgSpec::optional("app", ArgType::String))
            .with_output_schema(json!({ "type": "array" }))
            .to_tool();

        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["inputSchema"]["properties"]["app"]["type"], "string");
        assert_eq!(json["outputSchema"]["properties"]["result"]["type"], "array");
        assert_eq!(json["annotations"]["readOnlyHint"], true);
    }
}
