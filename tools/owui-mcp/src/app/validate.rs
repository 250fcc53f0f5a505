//! Argument validation against a tool's declared parameters.
//!
//! Checks run before the underlying operation is touched: unknown fields,
//! missing required fields, and shape mismatches are all reported together,
//! each naming the offending field. Declared defaults are injected for
//! omitted parameters so the invoked method observes them.

use owui_client::surface::{FieldSpec, TypeShape};
use serde_json::{Map, Value};

use crate::domain::schema::MAX_DEPTH;
use crate::shared::types::FieldFault;

pub fn validate_arguments(
    params: &[FieldSpec],
    mut args: Map<String, Value>,
) -> Result<Map<String, Value>, Vec<FieldFault>> {
    let mut faults = Vec::new();

    for key in args.keys() {
        if !params.iter().any(|p| p.name == key) {
            faults.push(FieldFault::new(key.clone(), "unknown field"));
        }
    }

    for param in params {
        match args.get(param.name) {
            Some(value) => check_value(param.name.to_string(), value, &param.shape, 0, &mut faults),
            None => {
                if let Some(default) = &param.default {
                    args.insert(param.name.to_string(), default.clone());
                } else if param.required {
                    faults.push(FieldFault::new(param.name, "missing required field"));
                }
            }
        }
    }

    if faults.is_empty() { Ok(args) } else { Err(faults) }
}

fn check_value(path: String, value: &Value, shape: &TypeShape, depth: usize, faults: &mut Vec<FieldFault>) {
    if depth >= MAX_DEPTH {
        // Mirrors the schema deriver: past the expansion bound anything goes.
        return;
    }
    match shape {
        TypeShape::String => {
            if !value.is_string() {
                faults.push(FieldFault::new(path, "expected string"));
            }
        }
        TypeShape::Integer => {
            if value.as_i64().is_none() && value.as_u64().is_none() {
                faults.push(FieldFault::new(path, "expected integer"));
            }
        }
        TypeShape::Number => {
            if !value.is_number() {
                faults.push(FieldFault::new(path, "expected number"));
            }
        }
        TypeShape::Boolean => {
            if !value.is_boolean() {
                faults.push(FieldFault::new(path, "expected boolean"));
            }
        }
        TypeShape::Enum(variants) => match value.as_str() {
            Some(text) if variants.contains(&text) => {}
            _ => faults.push(FieldFault::new(path, format!("expected one of {variants:?}"))),
        },
        TypeShape::Optional(inner) => {
            if !value.is_null() {
                check_value(path, value, inner, depth, faults);
            }
        }
        TypeShape::List(item) => match value.as_array() {
            Some(items) => {
                for (index, element) in items.iter().enumerate() {
                    check_value(format!("{path}[{index}]"), element, item, depth + 1, faults);
                }
            }
            None => faults.push(FieldFault::new(path, "expected array")),
        },
        TypeShape::Map => {
            if !value.is_object() {
                faults.push(FieldFault::new(path, "expected object"));
            }
        }
        TypeShape::Any => {}
        TypeShape::Record(record) => match value.as_object() {
            None => faults.push(FieldFault::new(path, "expected object")),
            Some(map) => {
                let fields = (record.fields)();
                for key in map.keys() {
                    if !fields.iter().any(|f| f.name == key) {
                        faults.push(FieldFault::new(format!("{path}.{key}"), "unknown field"));
                    }
                }
                for field in &fields {
                    match map.get(field.name) {
                        Some(nested) => check_value(
                            format!("{path}.{}", field.name),
                            nested,
                            &field.shape,
                            depth + 1,
                            faults,
                        ),
                        None => {
                            if field.required && field.default.is_none() {
                                faults.push(FieldFault::new(
                                    format!("{path}.{}", field.name),
                                    "missing required field",
                                ));
                            }
                        }
                    }
                }
            }
        },
    }
}
