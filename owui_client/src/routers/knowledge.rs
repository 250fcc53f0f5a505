use std::sync::Arc;

use serde::Deserialize;
use serde_json::to_value;

use crate::error::ClientError;
use crate::models::{KnowledgeBase, KnowledgeForm};
use crate::surface::{FieldSpec, OperationDef, Resource, TypeShape};
use crate::transport::Transport;

/// Knowledge-base endpoints (`/api/v1/knowledge`).
#[derive(Clone)]
pub struct Knowledge {
    transport: Arc<Transport>,
}

impl Knowledge {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<Vec<KnowledgeBase>, ClientError> {
        self.transport.get("v1/knowledge/list", &[]).await
    }

    pub async fn get(&self, id: &str) -> Result<KnowledgeBase, ClientError> {
        self.transport.get(&format!("v1/knowledge/{id}"), &[]).await
    }

    pub async fn create(&self, form: &KnowledgeForm) -> Result<KnowledgeBase, ClientError> {
        self.transport.post("v1/knowledge/create", form).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, ClientError> {
        self.transport.delete(&format!("v1/knowledge/{id}")).await
    }
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

impl Resource for Knowledge {
    fn name(&self) -> &'static str {
        "knowledge"
    }

    fn operations(&self) -> Vec<OperationDef> {
        vec![
            OperationDef::new("list", "List knowledge bases.").handler({
                let knowledge = self.clone();
                move |_args| {
                    let knowledge = knowledge.clone();
                    Box::pin(async move { Ok(to_value(knowledge.list().await?)?) })
                }
            }),
            OperationDef::new("get", "Fetch one knowledge base by id.")
                .param(FieldSpec::required("id", TypeShape::String))
                .handler({
                    let knowledge = self.clone();
                    move |args| {
                        let knowledge = knowledge.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(knowledge.get(&args.id).await?)?)
                        })
                    }
                }),
            OperationDef::new("create", "Create a knowledge base.")
                .params_of::<KnowledgeForm>()
                .handler({
                    let knowledge = self.clone();
                    move |args| {
                        let knowledge = knowledge.clone();
                        Box::pin(async move {
                            let form: KnowledgeForm = serde_json::from_value(args)?;
                            Ok(to_value(knowledge.create(&form).await?)?)
                        })
                    }
                }),
            OperationDef::new("delete", "Delete a knowledge base by id.")
                .param(FieldSpec::required("id", TypeShape::String))
                .handler({
                    let knowledge = self.clone();
                    move |args| {
                        let knowledge = knowledge.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(knowledge.delete(&args.id).await?)?)
                        })
                    }
                }),
        ]
    }
}
