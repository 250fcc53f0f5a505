//! Walks the client root's router surface and collects candidate operations.
//!
//! A router qualifies because it implements the `Resource` capability
//! contract, not because of its name. Infrastructure method names and
//! underscore-prefixed names are filtered here so they never reach the
//! registry. Discovery is restartable: the same client yields the same set.

use owui_client::surface::{OperationDef, Resource};
use owui_client::OpenWebUi;

/// Method names that belong to the introspection plumbing itself.
const RESERVED_METHODS: &[&str] = &["name", "operations", "resources", "transport"];

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("client surface exposes no routers; refusing to start with an empty registry")]
    EmptySurface,

    #[error("router name '{0}' is not usable as a tool prefix")]
    InvalidRouterName(String),

    #[error(
        "tool name '{tool_name}' produced by both {first_router}.{first_method} \
         and {second_router}.{second_method}"
    )]
    NameCollision {
        tool_name: String,
        first_router: String,
        first_method: String,
        second_router: String,
        second_method: String,
    },
}

#[derive(Debug)]
pub struct DiscoveredRouter {
    pub name: &'static str,
    pub operations: Vec<OperationDef>,
}

pub fn discover(client: &OpenWebUi) -> Result<Vec<DiscoveredRouter>, DiscoveryError> {
    discover_resources(&client.resources())
}

pub fn discover_resources(
    resources: &[&dyn Resource],
) -> Result<Vec<DiscoveredRouter>, DiscoveryError> {
    if resources.is_empty() {
        return Err(DiscoveryError::EmptySurface);
    }

    let mut routers = Vec::new();
    for resource in resources {
        let name = resource.name();
        if name.is_empty() {
            return Err(DiscoveryError::InvalidRouterName(name.to_string()));
        }
        if name.starts_with('_') {
            tracing::debug!(router = name, "skipping private router");
            continue;
        }

        let operations: Vec<OperationDef> = resource
            .operations()
            .into_iter()
            .filter(|op| {
                let keep = !op.name.starts_with('_') && !RESERVED_METHODS.contains(&op.name);
                if !keep {
                    tracing::debug!(router = name, method = op.name, "skipping non-operation method");
                }
                keep
            })
            .collect();

        tracing::debug!(router = name, operations = operations.len(), "router discovered");
        routers.push(DiscoveredRouter { name, operations });
    }
    Ok(routers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owui_client::surface::{OperationDef, Resource};
    use serde_json::Value;

    struct Fixture {
        name: &'static str,
        methods: &'static [&'static str],
    }

    impl Resource for Fixture {
        fn name(&self) -> &'static str {
            self.name
        }

        fn operations(&self) -> Vec<OperationDef> {
            self.methods
                .iter()
                .copied()
                .map(|m| OperationDef::new(m, "").handler(|_| Box::pin(async { Ok(Value::Null) })))
                .collect()
        }
    }

    #[test]
    fn empty_surface_is_fatal() {
        let err = discover_resources(&[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::EmptySurface));
    }

    #[test]
    fn private_routers_are_skipped() {
        let public = Fixture { name: "chats", methods: &["list"] };
        let private = Fixture { name: "_internal", methods: &["poke"] };
        let routers = discover_resources(&[&public, &private]).unwrap();
        let names: Vec<&str> = routers.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["chats"]);
    }

    #[test]
    fn reserved_and_underscored_methods_are_excluded() {
        let fixture = Fixture {
            name: "chats",
            methods: &["list", "_refresh", "operations", "transport", "get"],
        };
        let routers = discover_resources(&[&fixture]).unwrap();
        let ops: Vec<&str> = routers[0].operations.iter().map(|o| o.name).collect();
        assert_eq!(ops, vec!["list", "get"]);
    }

    #[test]
    fn rediscovery_yields_the_same_set() {
        let fixture = Fixture { name: "chats", methods: &["list", "get"] };
        let first: Vec<String> = discover_resources(&[&fixture])
            .unwrap()
            .iter()
            .flat_map(|r| r.operations.iter().map(|o| format!("{}/{}", r.name, o.name)))
            .collect();
        let second: Vec<String> = discover_resources(&[&fixture])
            .unwrap()
            .iter()
            .flat_map(|r| r.operations.iter().map(|o| format!("{}/{}", r.name, o.name)))
            .collect();
        assert_eq!(first, second);
    }
}
