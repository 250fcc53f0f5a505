//! The introspection surface routers publish about themselves.
//!
//! [`Resource`] is the capability contract a router implements to be
//! discoverable; an attribute of the client root counts as a router because
//! it implements this trait, never because of its name. Each operation is
//! described by an [`OperationDef`]: the method name, a doc line, the
//! parameter specifications, and the bound async invoker that accepts a JSON
//! argument object and yields a JSON result.
//!
//! Parameter types describe themselves with [`TypeShape`], a closed
//! vocabulary of shapes. Structured models implement [`Describe`] and expand
//! to [`TypeShape::Record`]; the record's fields are produced by a function
//! pointer so that shapes stay cheap to construct and cyclic definitions do
//! not recurse at construction time.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::ClientError;

pub type InvokeFuture = BoxFuture<'static, Result<Value, ClientError>>;
pub type Invoker = Arc<dyn Fn(Value) -> InvokeFuture + Send + Sync>;

/// Capability contract for routers: a named group of invocable operations.
pub trait Resource: Send + Sync {
    /// Router name as exposed on the tool surface.
    fn name(&self) -> &'static str;

    /// The operations this router publishes. Enumeration is restartable:
    /// repeated calls yield the same set in the same order.
    fn operations(&self) -> Vec<OperationDef>;
}

/// Closed set of parameter shapes.
#[derive(Debug, Clone)]
pub enum TypeShape {
    String,
    Integer,
    Number,
    Boolean,
    /// Nullable value; optionality is reflected in the enclosing field.
    Optional(Box<TypeShape>),
    List(Box<TypeShape>),
    /// String-keyed object with unconstrained values.
    Map,
    /// Enumeration of string literals.
    Enum(&'static [&'static str]),
    Record(RecordShape),
    /// Anything goes; used where a tighter shape is not known.
    Any,
}

/// A named structured model. `fields` is called lazily during expansion.
#[derive(Debug, Clone, Copy)]
pub struct RecordShape {
    pub name: &'static str,
    pub fields: fn() -> Vec<FieldSpec>,
}

/// One named parameter or record field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: TypeShape,
    pub required: bool,
    pub default: Option<Value>,
    pub doc: Option<&'static str>,
}

impl FieldSpec {
    pub fn required(name: &'static str, shape: TypeShape) -> Self {
        Self {
            name,
            shape,
            required: true,
            default: None,
            doc: None,
        }
    }

    pub fn optional(name: &'static str, shape: TypeShape) -> Self {
        Self {
            name,
            shape,
            required: false,
            default: None,
            doc: None,
        }
    }

    /// Optional field with a declared default, injected when omitted.
    pub fn with_default(name: &'static str, shape: TypeShape, default: Value) -> Self {
        Self {
            name,
            shape,
            required: false,
            default: Some(default),
            doc: None,
        }
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }
}

/// Self-describing parameter model.
pub trait Describe {
    fn shape() -> TypeShape;
}

impl Describe for String {
    fn shape() -> TypeShape {
        TypeShape::String
    }
}

impl Describe for i64 {
    fn shape() -> TypeShape {
        TypeShape::Integer
    }
}

impl Describe for u64 {
    fn shape() -> TypeShape {
        TypeShape::Integer
    }
}

impl Describe for f64 {
    fn shape() -> TypeShape {
        TypeShape::Number
    }
}

impl Describe for bool {
    fn shape() -> TypeShape {
        TypeShape::Boolean
    }
}

impl Describe for Value {
    fn shape() -> TypeShape {
        TypeShape::Any
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::Optional(Box::new(T::shape()))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::List(Box::new(T::shape()))
    }
}

/// One invocable operation: name, doc line, parameters, bound callable.
#[derive(Clone)]
pub struct OperationDef {
    pub name: &'static str,
    pub doc: &'static str,
    pub params: Vec<FieldSpec>,
    pub invoke: Invoker,
}

impl std::fmt::Debug for OperationDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDef")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl OperationDef {
    pub fn new(name: &'static str, doc: &'static str) -> OperationBuilder {
        OperationBuilder {
            name,
            doc,
            params: Vec::new(),
        }
    }
}

pub struct OperationBuilder {
    name: &'static str,
    doc: &'static str,
    params: Vec<FieldSpec>,
}

impl OperationBuilder {
    pub fn param(mut self, param: FieldSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Flatten a record model's fields into this operation's parameters.
    /// Non-record shapes contribute a single `value` parameter instead.
    pub fn params_of<T: Describe>(mut self) -> Self {
        match T::shape() {
            TypeShape::Record(record) => self.params.extend((record.fields)()),
            other => self.params.push(FieldSpec::required("value", other)),
        }
        self
    }

    pub fn handler<F>(self, invoke: F) -> OperationDef
    where
        F: Fn(Value) -> InvokeFuture + Send + Sync + 'static,
    {
        OperationDef {
            name: self.name,
            doc: self.doc,
            params: self.params,
            invoke: Arc::new(invoke),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn container_shapes_nest() {
        match <Option<Vec<String>>>::shape() {
            TypeShape::Optional(inner) => match *inner {
                TypeShape::List(item) => assert!(matches!(*item, TypeShape::String)),
                other => panic!("expected list, got {other:?}"),
            },
            other => panic!("expected optional, got {other:?}"),
        }
    }

    #[test]
    fn field_builder_carries_default() {
        let field = FieldSpec::with_default("page", TypeShape::Integer, json!(1)).doc("page number");
        assert!(!field.required);
        assert_eq!(field.default, Some(json!(1)));
        assert_eq!(field.doc, Some("page number"));
    }

    #[test]
    fn params_of_flattens_records() {
        fn pair_fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::required("a", TypeShape::Integer),
                FieldSpec::with_default("b", TypeShape::String, json!("x")),
            ]
        }
        struct Pair;
        impl Describe for Pair {
            fn shape() -> TypeShape {
                TypeShape::Record(RecordShape {
                    name: "Pair",
                    fields: pair_fields,
                })
            }
        }

        let op = OperationDef::new("noop", "")
            .params_of::<Pair>()
            .handler(|_| Box::pin(async { Ok(Value::Null) }));
        let names: Vec<&str> = op.params.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
