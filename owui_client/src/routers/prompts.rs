use std::sync::Arc;

use serde::Deserialize;
use serde_json::to_value;

use crate::error::ClientError;
use crate::models::{Prompt, PromptForm};
use crate::surface::{FieldSpec, OperationDef, Resource, TypeShape};
use crate::transport::Transport;

/// Prompt library endpoints (`/api/v1/prompts`). Prompts are addressed by
/// their slash command rather than a synthetic id.
#[derive(Clone)]
pub struct Prompts {
    transport: Arc<Transport>,
}

impl Prompts {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<Vec<Prompt>, ClientError> {
        self.transport.get("v1/prompts/list", &[]).await
    }

    pub async fn get(&self, command: &str) -> Result<Prompt, ClientError> {
        let command = command.trim_start_matches('/');
        self.transport.get(&format!("v1/prompts/command/{command}"), &[]).await
    }

    pub async fn create(&self, form: &PromptForm) -> Result<Prompt, ClientError> {
        self.transport.post("v1/prompts/create", form).await
    }

    pub async fn delete(&self, command: &str) -> Result<bool, ClientError> {
        let command = command.trim_start_matches('/');
        self.transport.delete(&format!("v1/prompts/command/{command}")).await
    }
}

#[derive(Deserialize)]
struct CommandArgs {
    command: String,
}

impl Resource for Prompts {
    fn name(&self) -> &'static str {
        "prompts"
    }

    fn operations(&self) -> Vec<OperationDef> {
        vec![
            OperationDef::new("list", "List the prompt library.").handler({
                let prompts = self.clone();
                move |_args| {
                    let prompts = prompts.clone();
                    Box::pin(async move { Ok(to_value(prompts.list().await?)?) })
                }
            }),
            OperationDef::new("get", "Fetch a prompt by its slash command.")
                .param(FieldSpec::required("command", TypeShape::String))
                .handler({
                    let prompts = self.clone();
                    move |args| {
                        let prompts = prompts.clone();
                        Box::pin(async move {
                            let args: CommandArgs = serde_json::from_value(args)?;
                            Ok(to_value(prompts.get(&args.command).await?)?)
                        })
                    }
                }),
            OperationDef::new("create", "Add a prompt to the library.")
                .params_of::<PromptForm>()
                .handler({
                    let prompts = self.clone();
                    move |args| {
                        let prompts = prompts.clone();
                        Box::pin(async move {
                            let form: PromptForm = serde_json::from_value(args)?;
                            Ok(to_value(prompts.create(&form).await?)?)
                        })
                    }
                }),
            OperationDef::new("delete", "Delete a prompt by its slash command.")
                .param(FieldSpec::required("command", TypeShape::String))
                .handler({
                    let prompts = self.clone();
                    move |args| {
                        let prompts = prompts.clone();
                        Box::pin(async move {
                            let args: CommandArgs = serde_json::from_value(args)?;
                            Ok(to_value(prompts.delete(&args.command).await?)?)
                        })
                    }
                }),
        ]
    }
}
