//! Request and response models for the API surface.
//!
//! Form models (the ones accepted as operation parameters) implement
//! [`Describe`] so their field layout, defaults included, is visible to
//! generic callers.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::surface::{Describe, FieldSpec, RecordShape, TypeShape};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatForm {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub archived: bool,
}

impl ChatForm {
    fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("title", TypeShape::String).doc("Chat title"),
            FieldSpec::with_default("tags", TypeShape::List(Box::new(TypeShape::String)), json!([])),
            FieldSpec::with_default("archived", TypeShape::Boolean, json!(false)),
        ]
    }
}

impl Describe for ChatForm {
    fn shape() -> TypeShape {
        TypeShape::Record(RecordShape {
            name: "ChatForm",
            fields: ChatForm::field_specs,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Visibility of a shared prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Private,
    Public,
}

impl Describe for AccessLevel {
    fn shape() -> TypeShape {
        TypeShape::Enum(&["private", "public"])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub command: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub access: AccessLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptForm {
    pub command: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub access: AccessLevel,
}

impl PromptForm {
    fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("command", TypeShape::String).doc("Slash command, e.g. `/summarize`"),
            FieldSpec::required("title", TypeShape::String),
            FieldSpec::required("content", TypeShape::String).doc("Prompt body"),
            FieldSpec::with_default("access", AccessLevel::shape(), json!("private")),
        ]
    }
}

impl Describe for PromptForm {
    fn shape() -> TypeShape {
        TypeShape::Record(RecordShape {
            name: "PromptForm",
            fields: PromptForm::field_specs,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl KnowledgeForm {
    fn field_specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("name", TypeShape::String),
            FieldSpec::with_default("description", TypeShape::String, json!("")),
            FieldSpec::optional("data", TypeShape::Any).doc("Opaque collection payload"),
        ]
    }
}

impl Describe for KnowledgeForm {
    fn shape() -> TypeShape {
        TypeShape::Record(RecordShape {
            name: "KnowledgeForm",
            fields: KnowledgeForm::field_specs,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
    Pending,
}

impl Describe for UserRole {
    fn shape() -> TypeShape {
        TypeShape::Enum(&["admin", "user", "pending"])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_form_declares_description_default() {
        let TypeShape::Record(record) = KnowledgeForm::shape() else {
            panic!("expected record shape");
        };
        let fields = (record.fields)();
        let description = fields.iter().find(|f| f.name == "description").unwrap();
        assert!(!description.required);
        assert_eq!(description.default, Some(json!("")));

        let name = fields.iter().find(|f| f.name == "name").unwrap();
        assert!(name.required);
        assert!(name.default.is_none());
    }

    #[test]
    fn serde_defaults_match_declared_defaults() {
        let form: KnowledgeForm = serde_json::from_value(json!({"name": "docs"})).unwrap();
        assert_eq!(form.description, "");
        assert!(form.data.is_none());

        let form: ChatForm = serde_json::from_value(json!({"title": "hello"})).unwrap();
        assert!(form.tags.is_empty());
        assert!(!form.archived);
    }

    #[test]
    fn access_level_round_trips_as_snake_case() {
        assert_eq!(serde_json::to_value(AccessLevel::Private).unwrap(), json!("private"));
        let access: AccessLevel = serde_json::from_value(json!("public")).unwrap();
        assert_eq!(access, AccessLevel::Public);
    }
}
