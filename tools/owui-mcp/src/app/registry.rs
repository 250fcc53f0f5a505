//! The immutable tool registry: one entry per discovered operation.
//!
//! Built exactly once before the serve loop starts; reads need no lock
//! because no writer exists afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use owui_client::surface::{FieldSpec, Invoker};
use rmcp::model::{JsonObject, Tool};

use crate::app::discovery::{DiscoveredRouter, DiscoveryError};
use crate::domain::schema;

/// Two characters that cannot appear in a router or method identifier pair
/// without producing a detectable collision.
pub const SEPARATOR: &str = "__";

pub fn tool_name(router: &str, method: &str) -> String {
    format!("{router}{SEPARATOR}{method}")
}

pub struct ToolEntry {
    pub tool_name: String,
    pub router_name: &'static str,
    pub method_name: &'static str,
    pub description: String,
    pub params: Vec<FieldSpec>,
    pub input_schema: Arc<JsonObject>,
    pub invoke: Invoker,
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("tool_name", &self.tool_name)
            .field("router_name", &self.router_name)
            .field("method_name", &self.method_name)
            .field("description", &self.description)
            .field("params", &self.params)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ToolRegistry {
    entries: BTreeMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn build(routers: Vec<DiscoveredRouter>) -> Result<Self, DiscoveryError> {
        let mut entries: BTreeMap<String, ToolEntry> = BTreeMap::new();

        for router in routers {
            for op in router.operations {
                let name = tool_name(router.name, op.name);
                if let Some(existing) = entries.get(&name) {
                    return Err(DiscoveryError::NameCollision {
                        tool_name: name,
                        first_router: existing.router_name.to_string(),
                        first_method: existing.method_name.to_string(),
                        second_router: router.name.to_string(),
                        second_method: op.name.to_string(),
                    });
                }

                let description = if op.doc.is_empty() {
                    format!("{}.{}", router.name, op.name)
                } else {
                    op.doc.to_string()
                };
                let input_schema = Arc::new(schema::input_schema(&op.params));
                entries.insert(
                    name.clone(),
                    ToolEntry {
                        tool_name: name,
                        router_name: router.name,
                        method_name: op.name,
                        description,
                        params: op.params,
                        input_schema,
                        invoke: op.invoke,
                    },
                );
            }
        }

        Ok(Self { entries })
    }

    /// Tool descriptors for protocol discovery, sorted by name.
    pub fn list(&self) -> Vec<Tool> {
        self.entries
            .values()
            .map(|entry| {
                Tool::new(
                    entry.tool_name.clone(),
                    entry.description.clone(),
                    entry.input_schema.clone(),
                )
            })
            .collect()
    }

    pub fn resolve(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
