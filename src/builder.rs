//! Builds the SDL text and the root value from one set of declarations.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::ast::AstNode;
use crate::converter::Converter;
use crate::define::{ResolverDef, Signature, TypeDef};
use crate::error::{ConvertError, ResolveError};
use crate::registry::invert;
use crate::wrap::{validate_args, wrap_raw, Catalog, Resolved};

/// Types, queries and mutations, each in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub types: Vec<(String, TypeDef)>,
    pub queries: Vec<(String, ResolverDef)>,
    pub mutations: Vec<(String, ResolverDef)>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, name: impl Into<String>, def: TypeDef) -> Self {
        self.types.push((name.into(), def));
        self
    }

    pub fn query(mut self, name: impl Into<String>, def: ResolverDef) -> Self {
        self.queries.push((name.into(), def));
        self
    }

    pub fn mutation(mut self, name: impl Into<String>, def: ResolverDef) -> Self {
        self.mutations.push((name.into(), def));
        self
    }

    /// Signature of an operation (`getUser`) or a computed field (`User.hobbies`).
    pub fn signature(&self, address: &str) -> Option<&Signature> {
        if let Some((type_name, field)) = address.split_once('.') {
            let (_, def) = self.types.iter().find(|(name, _)| name == type_name)?;
            return def.get_field(field).map(|f| &f.signature);
        }
        self.queries
            .iter()
            .chain(&self.mutations)
            .find(|(name, _)| name == address)
            .map(|(_, def)| &def.signature)
    }
}

/// Root block an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// SDL name of the root type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
        }
    }
}

/// Output of [`yoko`]: SDL text and the matching root value.
#[derive(Debug, Clone)]
pub struct Yoko {
    pub schema: String,
    pub root_value: RootValue,
}

/// Every declared operation by name.
#[derive(Debug, Clone, Default)]
pub struct RootValue {
    operations: HashMap<String, Operation>,
}

impl RootValue {
    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Invoke an operation by name with a single arguments object.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Resolved, ResolveError> {
        let operation = self.get(name).ok_or_else(|| ResolveError::UnknownOperation {
            name: name.to_string(),
        })?;
        operation.invoke(args).await
    }
}

/// A top-level operation bound to the declarations it was built from.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    kind: OperationKind,
    def: ResolverDef,
    returns: Arc<AstNode>,
    catalog: Arc<Catalog>,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn definition(&self) -> &ResolverDef {
        &self.def
    }

    /// Validate `args`, run the implementation and wrap its result.
    ///
    /// # Errors
    ///
    /// Rejects with `ResolveError::InvalidArguments` when `args` fail the
    /// declared argument schema, `ResolveError::Resolver` when the
    /// implementation fails, and `ResolveError::ShapeMismatch` when the result
    /// cannot be wrapped as the declared return type.
    pub async fn invoke(&self, args: Value) -> Result<Resolved, ResolveError> {
        let target = format!("{}.{}", self.kind.type_name(), self.name);
        debug!(operation = %target, "invoking operation");

        let args = validate_args(&target, self.def.signature.args.as_ref(), &args)?;
        let Some(resolver) = &self.def.resolver else {
            return Err(ResolveError::Unimplemented { target });
        };

        let raw = resolver(args).await.map_err(|source| ResolveError::Resolver {
            target: target.clone(),
            source,
        })?;

        wrap_raw(&self.catalog, raw, &self.returns, &target)
    }
}

/// Convert declarations into SDL text and a root value.
///
/// The registry is built from every declared type before any conversion
/// runs, so types may reference each other regardless of declaration order.
///
/// # Errors
///
/// Returns the first `ConvertError` met; no partial schema is produced.
pub fn yoko(declarations: Declarations) -> Result<Yoko, ConvertError> {
    let Declarations {
        types,
        queries,
        mutations,
    } = declarations;

    let registry = invert(types.iter().map(|(name, def)| (name.as_str(), &def.shape)))?;
    let converter = Converter::new(registry);

    let mut blocks = Vec::new();
    let mut catalog = Catalog::default();
    for (name, def) in &types {
        let converted = converter.convert_type(name, def)?;
        blocks.push(converter.render_block(name, &converted.fields)?);
        catalog.insert(name, def, &converted.fields, converted.computed);
    }
    let catalog = Arc::new(catalog);

    let mut operations = HashMap::new();
    for (kind, defs) in [
        (OperationKind::Query, &queries),
        (OperationKind::Mutation, &mutations),
    ] {
        let nodes = converter.convert_resolver_map(kind.type_name(), defs)?;
        if !nodes.is_empty() {
            blocks.push(converter.render_block(kind.type_name(), &nodes)?);
        }

        for ((name, def), (_, node)) in defs.iter().zip(nodes) {
            let operation = Operation {
                name: name.clone(),
                kind,
                def: def.clone(),
                returns: Arc::new(node),
                catalog: catalog.clone(),
            };
            if operations.insert(name.clone(), operation).is_some() {
                return Err(ConvertError::DuplicateName { name: name.clone() });
            }
        }
    }

    debug!(
        types = types.len(),
        queries = queries.len(),
        mutations = mutations.len(),
        "declarations converted"
    );

    Ok(Yoko {
        schema: blocks.join("\n"),
        root_value: RootValue { operations },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::FieldDef;
    use crate::schema::{ObjectSchema, Schema};
    use serde_json::json;

    fn user() -> ObjectSchema {
        ObjectSchema::new([("id", Schema::string()), ("name", Schema::string())])
    }

    #[test]
    fn schema_blocks_in_order() {
        let user = user();
        let decls = Declarations::new()
            .with_type("User", TypeDef::new(user.clone()))
            .query("me", ResolverDef::from_fn(user.clone(), |_| Ok(json!(null))))
            .mutation(
                "rename",
                ResolverDef::from_fn(user.clone(), |_| Ok(json!(null)))
                    .args(ObjectSchema::new([("name", Schema::string())])),
            );
        let built = yoko(decls).unwrap();
        assert_eq!(
            built.schema,
            "type User {\n  id: String!\n  name: String!\n}\n\
             type Query {\n  me: User!\n}\n\
             type Mutation {\n  rename(name: String!): User!\n}"
        );
        assert_eq!(built.root_value.len(), 2);
        assert_eq!(built.root_value.get("rename").unwrap().kind(), OperationKind::Mutation);
    }

    #[test]
    fn empty_roots_are_omitted() {
        let built = yoko(Declarations::new().with_type("User", TypeDef::new(user()))).unwrap();
        assert!(!built.schema.contains("Query"));
        assert!(!built.schema.contains("Mutation"));
        assert!(built.root_value.is_empty());
    }

    #[test]
    fn operation_name_shared_by_roots_is_rejected() {
        let decls = Declarations::new()
            .query("ping", ResolverDef::from_fn(Schema::string(), |_| Ok(json!(""))))
            .mutation("ping", ResolverDef::from_fn(Schema::string(), |_| Ok(json!(""))));
        let err = yoko(decls).unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateName { name } if name == "ping"));
    }

    #[test]
    fn unregistered_return_type_aborts() {
        let decls = Declarations::new()
            .query("me", ResolverDef::from_fn(user(), |_| Ok(json!(null))));
        let err = yoko(decls).unwrap_err();
        assert!(matches!(err, ConvertError::UnregisteredType { path } if path == "Query.me"));
    }

    #[test]
    fn signature_lookup() {
        let user = user();
        let decls = Declarations::new()
            .with_type(
                "User",
                TypeDef::new(user.clone()).field(
                    "upper",
                    FieldDef::from_fn(Schema::string(), |_, _| Ok(json!(""))),
                ),
            )
            .query(
                "getUser",
                ResolverDef::from_fn(user.clone(), |_| Ok(json!(null)))
                    .args(ObjectSchema::new([("id", Schema::string())])),
            )
            .mutation("reset", ResolverDef::from_fn(Schema::boolean(), |_| Ok(json!(true))));

        assert!(decls.signature("getUser").unwrap().args.is_some());
        assert!(decls.signature("reset").unwrap().args.is_none());
        assert!(decls.signature("User.upper").is_some());
        assert!(decls.signature("User.id").is_none());
        assert!(decls.signature("Ghost.upper").is_none());
        assert!(decls.signature("missing").is_none());
    }

    #[tokio::test]
    async fn unknown_operation_rejects() {
        let built = yoko(Declarations::new()).unwrap();
        let err = built.root_value.invoke("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownOperation { name } if name == "nope"));
    }

    #[tokio::test]
    async fn unimplemented_operation_rejects() {
        let decls = Declarations::new().query(
            "ping",
            ResolverDef::unimplemented(crate::define::Signature::new(Schema::string())),
        );
        let built = yoko(decls).unwrap();
        let err = built.root_value.invoke("ping", json!({})).await.unwrap_err();
        assert!(matches!(err, ResolveError::Unimplemented { target } if target == "Query.ping"));
    }

    #[tokio::test]
    async fn operation_without_args_skips_validation() {
        let decls = Declarations::new().query(
            "echo",
            ResolverDef::from_fn(Schema::any().nullable(), |args| Ok(args.clone())),
        );
        // `any` has no SDL counterpart
        assert!(yoko(decls).is_err());

        let decls = Declarations::new().query(
            "count",
            ResolverDef::from_fn(Schema::number(), |args| {
                Ok(json!(args.as_object().map_or(0, |m| m.len())))
            }),
        );
        let built = yoko(decls).unwrap();
        let resolved = built
            .root_value
            .invoke("count", json!({ "ignored": true }))
            .await
            .unwrap();
        assert_eq!(resolved.as_value(), Some(&json!(0)));
    }

    #[tokio::test]
    async fn computed_field_declared_by_signature_only() {
        let user = user();
        let decls = Declarations::new()
            .with_type(
                "User",
                TypeDef::new(user.clone()).field(
                    "upper",
                    FieldDef::unimplemented(crate::define::Signature::new(Schema::string())),
                ),
            )
            .query(
                "me",
                ResolverDef::from_fn(user.clone(), |_| Ok(json!({ "id": "1", "name": "a" }))),
            );
        let built = yoko(decls).unwrap();
        let me = built.root_value.invoke("me", Value::Null).await.unwrap();
        let err = me.as_object().unwrap().call("upper", Value::Null).await.unwrap_err();
        assert!(matches!(err, ResolveError::Unimplemented { target } if target == "User.upper"));
    }
}
