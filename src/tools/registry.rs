//! Session-wide registry of discovered tools.

use tracing::{info, warn};

use crate::error::ChatError;
use crate::provider::ToolDefinition;
use crate::types::ToolDescriptor;

use super::provider::ToolProvider;

/// Immutable set of tool descriptors discovered at session start.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Run discovery against `provider`.
    ///
    /// Any failure is a provider connection error: a session without tools
    /// cannot do anything useful.
    pub async fn discover(provider: &dyn ToolProvider) -> Result<Self, ChatError> {
        let tools = provider.list_tools().await.map_err(|e| match e {
            ChatError::ProviderConnection(_) => e,
            other => ChatError::ProviderConnection(format!("tool discovery failed: {other}")),
        })?;
        let registry = Self::from_descriptors(tools);
        info!(tools = ?registry.names(), "discovered tools");
        Ok(registry)
    }

    /// Build a registry, keeping the first descriptor for any repeated name.
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut tools: Vec<ToolDescriptor> = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if tools.iter().any(|t| t.name == descriptor.name) {
                warn!(tool = %descriptor.name, "duplicate tool name from provider, ignoring");
                continue;
            }
            tools.push(descriptor);
        }
        Self { tools }
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Model-facing tool definitions.
    ///
    /// With `forward_schemas` off, each tool gets an empty object schema; the
    /// Messages API rejects tools without one.
    pub fn definitions(&self, forward_schemas: bool) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: if forward_schemas {
                    tool.input_schema.clone()
                } else {
                    serde_json::json!({ "type": "object" })
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add_tool() -> ToolDescriptor {
        ToolDescriptor::new("add", "Add two numbers").with_input_schema(json!({
            "type": "object",
            "properties": { "a": { "type": "number" }, "b": { "type": "number" } },
            "required": ["a", "b"]
        }))
    }

    #[test]
    fn duplicate_names_keep_first_descriptor() {
        let registry = ToolRegistry::from_descriptors(vec![
            add_tool(),
            ToolDescriptor::new("add", "shadow"),
            ToolDescriptor::new("echo", "Echo input"),
        ]);
        assert_eq!(registry.names(), vec!["add", "echo"]);
        assert_eq!(registry.get("add").unwrap().description, "Add two numbers");
    }

    #[test]
    fn definitions_forward_schema_when_enabled() {
        let registry = ToolRegistry::from_descriptors(vec![add_tool()]);

        let full = registry.definitions(true);
        assert_eq!(full[0].input_schema["required"], json!(["a", "b"]));

        let minimal = registry.definitions(false);
        assert_eq!(minimal[0].name, "add");
        assert_eq!(minimal[0].description, "Add two numbers");
        assert_eq!(minimal[0].input_schema, json!({ "type": "object" }));
    }

    #[test]
    fn contains_checks_exact_names() {
        let registry = ToolRegistry::from_descriptors(vec![add_tool()]);
        assert!(registry.contains("add"));
        assert!(!registry.contains("Add"));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
