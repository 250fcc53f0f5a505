//! Derives JSON Schema input descriptions from declared parameter shapes.
//!
//! The deriver is a visitor over the closed `TypeShape` set. Records expand
//! recursively; a record already on the current expansion path, or anything
//! past `MAX_DEPTH`, renders as an opaque object so one pathological model
//! never takes the whole registration pass down with it.

use owui_client::surface::{FieldSpec, TypeShape};
use serde_json::{Map, Value, json};

pub const MAX_DEPTH: usize = 8;

/// Render an operation's parameter list as a JSON Schema object.
pub fn input_schema(params: &[FieldSpec]) -> Map<String, Value> {
    let mut path = Vec::new();
    render_fields(params, &mut path)
}

fn render_fields(fields: &[FieldSpec], path: &mut Vec<&'static str>) -> Map<String, Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        let mut prop = render_shape(&field.shape, path);
        if let Some(doc) = field.doc {
            annotate(&mut prop, "description", json!(doc));
        }
        if let Some(default) = &field.default {
            annotate(&mut prop, "default", default.clone());
        }
        properties.insert(field.name.to_string(), prop);
        if field.required && field.default.is_none() {
            required.push(Value::String(field.name.to_string()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    schema
}

fn render_shape(shape: &TypeShape, path: &mut Vec<&'static str>) -> Value {
    match shape {
        TypeShape::String => json!({"type": "string"}),
        TypeShape::Integer => json!({"type": "integer"}),
        TypeShape::Number => json!({"type": "number"}),
        TypeShape::Boolean => json!({"type": "boolean"}),
        // Optionality lives in the enclosing `required` list.
        TypeShape::Optional(inner) => render_shape(inner, path),
        TypeShape::List(item) => json!({"type": "array", "items": render_shape(item, path)}),
        TypeShape::Map => json!({"type": "object"}),
        TypeShape::Enum(variants) => json!({"type": "string", "enum": variants}),
        TypeShape::Any => json!({}),
        TypeShape::Record(record) => {
            if path.contains(&record.name) || path.len() >= MAX_DEPTH {
                tracing::warn!(
                    record = record.name,
                    depth = path.len(),
                    "schema expansion truncated; emitting opaque object"
                );
                return json!({
                    "type": "object",
                    "description": format!("{} (expansion truncated)", record.name),
                });
            }
            path.push(record.name);
            let fields = (record.fields)();
            let rendered = render_fields(&fields, path);
            path.pop();
            Value::Object(rendered)
        }
    }
}

fn annotate(prop: &mut Value, key: &str, value: Value) {
    if let Value::Object(map) = prop {
        map.insert(key.to_string(), value);
    }
}
