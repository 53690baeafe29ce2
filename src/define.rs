//! Declarations: named types with computed fields, and top-level operations.
//!
//! Both carry a [`Signature`] (optional argument schema plus return schema)
//! and an implementation. Implementations may be async or plain functions;
//! either way they are invoked through one boxed-future shape.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::BoxError;
use crate::schema::{ObjectSchema, Schema};

/// Implementation of a computed field: `(parent, validated args) -> value`.
pub type FieldFn =
    Arc<dyn Fn(Value, Value) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Implementation of an operation: `validated args -> value`.
pub type OperationFn =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Argument and return schemas of a computed field or operation.
#[derive(Debug, Clone)]
pub struct Signature {
    pub args: Option<ObjectSchema>,
    pub returns: Schema,
}

impl Signature {
    pub fn new(returns: impl Into<Schema>) -> Self {
        Self {
            args: None,
            returns: returns.into(),
        }
    }

    pub fn with_args(mut self, args: ObjectSchema) -> Self {
        self.args = Some(args);
        self
    }
}

/// A computed field declared on a type.
#[derive(Clone)]
pub struct FieldDef {
    pub signature: Signature,
    pub(crate) resolver: Option<FieldFn>,
}

impl FieldDef {
    /// Declare a field backed by an async implementation.
    pub fn new<F, Fut>(returns: impl Into<Schema>, resolver: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self {
            signature: Signature::new(returns),
            resolver: Some(Arc::new(move |parent, args| resolver(parent, args).boxed())),
        }
    }

    /// Declare a field backed by a synchronous implementation.
    pub fn from_fn<F>(returns: impl Into<Schema>, resolver: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(returns),
            resolver: Some(Arc::new(move |parent, args| {
                future::ready(resolver(&parent, &args)).boxed()
            })),
        }
    }

    /// Declare a field by signature only. Invoking it is an error.
    pub fn unimplemented(signature: Signature) -> Self {
        Self {
            signature,
            resolver: None,
        }
    }

    pub fn args(mut self, args: ObjectSchema) -> Self {
        self.signature.args = Some(args);
        self
    }

    pub fn is_implemented(&self) -> bool {
        self.resolver.is_some()
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("signature", &self.signature)
            .field("implemented", &self.is_implemented())
            .finish()
    }
}

/// A declared type: a base shape plus computed fields, in declaration order.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub shape: ObjectSchema,
    pub fields: Vec<(String, FieldDef)>,
}

impl TypeDef {
    pub fn new(shape: ObjectSchema) -> Self {
        Self {
            shape,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldDef) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }
}

/// A top-level query or mutation.
#[derive(Clone)]
pub struct ResolverDef {
    pub signature: Signature,
    pub(crate) resolver: Option<OperationFn>,
}

impl ResolverDef {
    /// Declare an operation backed by an async implementation.
    pub fn new<F, Fut>(returns: impl Into<Schema>, resolver: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self {
            signature: Signature::new(returns),
            resolver: Some(Arc::new(move |args| resolver(args).boxed())),
        }
    }

    /// Declare an operation backed by a synchronous implementation.
    pub fn from_fn<F>(returns: impl Into<Schema>, resolver: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            signature: Signature::new(returns),
            resolver: Some(Arc::new(move |args| future::ready(resolver(&args)).boxed())),
        }
    }

    /// Declare an operation by signature only. Invoking it is an error.
    pub fn unimplemented(signature: Signature) -> Self {
        Self {
            signature,
            resolver: None,
        }
    }

    pub fn args(mut self, args: ObjectSchema) -> Self {
        self.signature.args = Some(args);
        self
    }

    pub fn is_implemented(&self) -> bool {
        self.resolver.is_some()
    }
}

impl fmt::Debug for ResolverDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverDef")
            .field("signature", &self.signature)
            .field("implemented", &self.is_implemented())
            .finish()
    }
}

/// Pair a base shape with its computed fields.
pub fn define_type<I, K>(shape: ObjectSchema, fields: I) -> TypeDef
where
    I: IntoIterator<Item = (K, FieldDef)>,
    K: Into<String>,
{
    TypeDef {
        shape,
        fields: fields
            .into_iter()
            .map(|(name, field)| (name.into(), field))
            .collect(),
    }
}

/// Declare an operation from its optional argument schema, return schema
/// and async implementation.
pub fn define_resolver<F, Fut>(
    args: Option<ObjectSchema>,
    returns: impl Into<Schema>,
    resolver: F,
) -> ResolverDef
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    let mut def = ResolverDef::new(returns, resolver);
    def.signature.args = args;
    def
}
