use std::sync::Arc;

use serde::Deserialize;
use serde_json::to_value;

use crate::error::ClientError;
use crate::models::ModelEntry;
use crate::surface::{FieldSpec, OperationDef, Resource, TypeShape};
use crate::transport::Transport;

/// Model registry endpoints (`/api/v1/models`). Read-mostly.
#[derive(Clone)]
pub struct Models {
    transport: Arc<Transport>,
}

impl Models {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<Vec<ModelEntry>, ClientError> {
        self.transport.get("v1/models/list", &[]).await
    }

    pub async fn get(&self, id: &str) -> Result<ModelEntry, ClientError> {
        self.transport.get(&format!("v1/models/{id}"), &[]).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, ClientError> {
        self.transport.delete(&format!("v1/models/{id}")).await
    }
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

impl Resource for Models {
    fn name(&self) -> &'static str {
        "models"
    }

    fn operations(&self) -> Vec<OperationDef> {
        vec![
            OperationDef::new("list", "List the models registered on the server.").handler({
                let models = self.clone();
                move |_args| {
                    let models = models.clone();
                    Box::pin(async move { Ok(to_value(models.list().await?)?) })
                }
            }),
            OperationDef::new("get", "Fetch one model entry by id.")
                .param(FieldSpec::required("id", TypeShape::String).doc("Model id, e.g. `llama3:8b`"))
                .handler({
                    let models = self.clone();
                    move |args| {
                        let models = models.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(models.get(&args.id).await?)?)
                        })
                    }
                }),
            OperationDef::new("delete", "Remove a model entry from the registry.")
                .param(FieldSpec::required("id", TypeShape::String))
                .handler({
                    let models = self.clone();
                    move |args| {
                        let models = models.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(models.delete(&args.id).await?)?)
                        })
                    }
                }),
        ]
    }
}
