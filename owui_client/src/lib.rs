//! Typed client for the Open WebUI REST API.
//!
//! The client is organized as a root [`OpenWebUi`] handle plus one router per
//! API area (`chats`, `models`, `prompts`, `knowledge`, `users`). Every router
//! implements [`Resource`], which publishes the router's operations together
//! with their parameter shapes so that callers can enumerate and invoke the
//! API surface generically instead of binding each method by hand.

pub mod error;
pub mod models;
pub mod routers;
pub mod surface;
pub mod transport;

pub use error::ClientError;
pub use surface::{Describe, FieldSpec, OperationDef, Resource, TypeShape};

use std::sync::Arc;
use std::time::Duration;

use crate::routers::{Chats, Knowledge, Models, Prompts, Users};
use crate::transport::Transport;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Open WebUI API, e.g. `http://127.0.0.1:8080/api`.
    pub api_url: String,
    /// Bearer token. Optional; unauthenticated requests may be rejected
    /// per-endpoint by the server.
    pub api_key: Option<String>,
    /// Per-request timeout. Defaults to 60 seconds.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

/// Root handle for an authenticated Open WebUI connection.
///
/// All routers share one HTTP transport (connection pool plus credentials).
/// The handle is constructed once and owned for the life of the process.
pub struct OpenWebUi {
    chats: Chats,
    models: Models,
    prompts: Prompts,
    knowledge: Knowledge,
    users: Users,
}

impl OpenWebUi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(Transport::new(config)?);
        Ok(Self {
            chats: Chats::new(transport.clone()),
            models: Models::new(transport.clone()),
            prompts: Prompts::new(transport.clone()),
            knowledge: Knowledge::new(transport.clone()),
            users: Users::new(transport),
        })
    }

    /// The routers exposed for introspection, in a stable order.
    pub fn resources(&self) -> Vec<&dyn Resource> {
        vec![
            &self.chats,
            &self.models,
            &self.prompts,
            &self.knowledge,
            &self.users,
        ]
    }

    pub fn chats(&self) -> &Chats {
        &self.chats
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    pub fn users(&self) -> &Users {
        &self.users
    }
}
