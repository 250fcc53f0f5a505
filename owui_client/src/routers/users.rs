use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::to_value;

use crate::error::ClientError;
use crate::models::{User, UserRole};
use crate::surface::{Describe, FieldSpec, OperationDef, Resource, TypeShape};
use crate::transport::Transport;

/// User administration endpoints (`/api/v1/users`). Most require an admin
/// credential; calls without one fail at invocation time.
#[derive(Clone)]
pub struct Users {
    transport: Arc<Transport>,
}

#[derive(Serialize)]
struct RoleUpdateBody<'a> {
    id: &'a str,
    role: UserRole,
}

impl Users {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, page: Option<i64>) -> Result<Vec<User>, ClientError> {
        let mut query = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        self.transport.get("v1/users/list", &query).await
    }

    pub async fn get(&self, id: &str) -> Result<User, ClientError> {
        self.transport.get(&format!("v1/users/{id}"), &[]).await
    }

    pub async fn update_role(&self, id: &str, role: UserRole) -> Result<User, ClientError> {
        self.transport
            .post("v1/users/update/role", &RoleUpdateBody { id, role })
            .await
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
struct RoleArgs {
    id: String,
    role: UserRole,
}

impl Resource for Users {
    fn name(&self) -> &'static str {
        "users"
    }

    fn operations(&self) -> Vec<OperationDef> {
        vec![
            OperationDef::new("list", "List registered users.")
                .param(FieldSpec::optional("page", TypeShape::Integer))
                .handler({
                    let users = self.clone();
                    move |args| {
                        let users = users.clone();
                        Box::pin(async move {
                            let args: PageArgs = serde_json::from_value(args)?;
                            Ok(to_value(users.list(args.page).await?)?)
                        })
                    }
                }),
            OperationDef::new("get", "Fetch one user by id.")
                .param(FieldSpec::required("id", TypeShape::String))
                .handler({
                    let users = self.clone();
                    move |args| {
                        let users = users.clone();
                        Box::pin(async move {
                            let args: IdArgs = serde_json::from_value(args)?;
                            Ok(to_value(users.get(&args.id).await?)?)
                        })
                    }
                }),
            OperationDef::new("update_role", "Change a user's role.")
                .param(FieldSpec::required("id", TypeShape::String))
                .param(FieldSpec::required("role", UserRole::shape()).doc("One of admin, user, pending"))
                .handler({
                    let users = self.clone();
                    move |args| {
                        let users = users.clone();
                        Box::pin(async move {
                            let args: RoleArgs = serde_json::from_value(args)?;
                            Ok(to_value(users.update_role(&args.id, args.role).await?)?)
                        })
                    }
                }),
        ]
    }
}
