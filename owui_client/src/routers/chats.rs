use std::sync::Arc;

use serde::Deserialize;
use serde_json::to_value;

use crate::error::ClientError;
use crate::models::{Chat, ChatForm, ChatSummary};
use crate::surface::{FieldSpec, OperationDef, Resource, TypeShape};
use crate::transport::Transport;

/// Conversation endpoints (`/api/v1/chats`).
#[derive(Clone)]
pub struct Chats {
    transport: Arc<Transport>,
}

impl Chats {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// List chats visible to the authenticated user.
    pub async fn list(&self, page: Option<i64>) -> Result<Vec<ChatSummary>, ClientError> {
        let mut query = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        self.transport.get("v1/chats/list", &query).await
    }

    /// Fetch one chat with its full conversation payload.
    pub async fn get(&self, id: &str) -> Result<Chat, ClientError> {
        self.transport.get(&format!("v1/chats/{id}"), &[]).await
    }

    pub async fn create(&self, form: &ChatForm) -> Result<Chat, ClientError> {
        self.transport.post("v1/chats/new", form).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, ClientError> {
        self.transport.delete(&format!("v1/chats/{id}")).await
    }

    /// Full-text search over chat titles.
    pub async fn search(&self, text: &str, page: Option<i64>) -> Result<Vec<ChatSummary>, ClientError> {
        let mut query = vec![("text", text.to_string())];
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        self.transport.get("v1/chats/search", &query).await
    }
}

#[derive(Deserialize)]
struct PageArgs {
    #[serde(default)]
    page: Option<i64>,
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    text: String,
    #[serde(default)]
    page: Option<i64>,
}

impl Resource for Chats {
    fn name(&self) -> &'static str {
        "chats"
    }

    fn operations(&self) -> Vec<OperationDef> {
        vec![
            OperationDef::new("list", "List chats visible to the authenticated user.")
                .param(FieldSpec::optional("page", TypeShape::Integer).doc("1-based result page"))
                .handler({
                    let chats = self.clone();
                    move |args| {
                        let chats = chats.clone();
                        Box::pin(async move {
                            let args: PageArgs = serde_json::from_value(args)?;
                            Ok(to_value(chats.list(args.page).await?)?)
                        })
                    }
                }),
            OperationDef::new("get", "Fetch one chat with its full conversation payload.")
                .param(FieldSpec::required("id", TypeShape::String))
                .handler({
                    let chats = self.clone();
                    move |args| {
                        let chats = chats.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(chats.get(&args.id).await?)?)
                        })
                    }
                }),
            OperationDef::new("create", "Create a new chat.")
                .params_of::<ChatForm>()
                .handler({
                    let chats = self.clone();
                    move |args| {
                        let chats = chats.clone();
                        Box::pin(async move {
                            let form: ChatForm = serde_json::from_value(args)?;
                            Ok(to_value(chats.create(&form).await?)?)
                        })
                    }
                }),
            OperationDef::new("delete", "Delete a chat by id.")
                .param(FieldSpec::required("id", TypeShape::String))
                .handler({
                    let chats = self.clone();
                    move |args| {
                        let chats = chats.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(chats.delete(&args.id).await?)?)
                        })
                    }
                }),
            OperationDef::new("search", "Full-text search over chat titles.")
                .param(FieldSpec::required("text", TypeShape::String).doc("Search text"))
                .param(FieldSpec::optional("page", TypeShape::Integer))
                .handler({
                    let chats = self.clone();
                    move |args| {
                        let chats = chats.clone();
                        Box::pin(async move {
                            let args: SearchArgs = serde_json::from_value(args)?;
                            Ok(to_value(chats.search(&args.text, args.page).await?)?)
                        })
                    }
                }),
        ]
    }
}
