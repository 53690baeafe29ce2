//! Value wrapping: attaching computed fields onto resolved data.
//!
//! Wrapping follows the declared AST node, not the runtime shape of the value.
//! Lists are wrapped element by element, objects become [`WrappedObject`]s
//! whose computed fields can be invoked, everything else passes through.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::ast::{AstKind, AstNode};
use crate::define::{FieldDef, TypeDef};
use crate::error::ResolveError;

/// A computed field together with the AST node of its return type.
#[derive(Debug)]
pub(crate) struct CompiledField {
    pub(crate) name: String,
    pub(crate) def: FieldDef,
    pub(crate) returns: AstNode,
}

#[derive(Debug)]
pub(crate) struct CompiledType {
    pub(crate) name: Arc<str>,
    /// Base shape fields that need wrapping: object references and lists of them.
    pub(crate) nested: Vec<(String, AstNode)>,
    pub(crate) fields: Vec<Arc<CompiledField>>,
}

impl CompiledType {
    fn field(&self, name: &str) -> Option<&Arc<CompiledField>> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn nested(&self, name: &str) -> Option<&AstNode> {
        self.nested.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }
}

/// Declared types by name, each with its computed fields already converted.
///
/// Built once per `yoko` call and shared read-only by every wrapped value.
#[derive(Debug, Default)]
pub struct Catalog {
    types: HashMap<String, CompiledType>,
}

impl Catalog {
    /// Register a converted type.
    ///
    /// `base` holds the SDL nodes of the shape fields; `returns` the field
    /// resolver node of each computed field, in declaration order.
    pub(crate) fn insert(
        &mut self,
        name: &str,
        def: &TypeDef,
        base: &[(String, AstNode)],
        returns: Vec<AstNode>,
    ) {
        let nested = base
            .iter()
            .filter(|(_, node)| reaches_object(node))
            .cloned()
            .collect();
        let fields = def
            .fields
            .iter()
            .zip(returns)
            .map(|((field_name, field), node)| {
                Arc::new(CompiledField {
                    name: field_name.clone(),
                    def: field.clone(),
                    returns: node,
                })
            })
            .collect();
        self.types.insert(
            name.to_string(),
            CompiledType {
                name: Arc::from(name),
                nested,
                fields,
            },
        );
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }
}

/// A resolved value, wrapped according to its declared type.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// Scalars, `null`, and anything not declared as a list or object.
    Value(Value),
    List(Vec<Resolved>),
    Object(WrappedObject),
}

impl Resolved {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Resolved]> {
        match self {
            Resolved::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&WrappedObject> {
        match self {
            Resolved::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Value(Value::Null))
    }

    /// Plain data without computed fields.
    pub fn to_plain(&self) -> Value {
        match self {
            Resolved::Value(value) => value.clone(),
            Resolved::List(items) => Value::Array(items.iter().map(Resolved::to_plain).collect()),
            Resolved::Object(object) => object.parent().clone(),
        }
    }
}

/// A field looked up on a [`WrappedObject`].
#[derive(Debug)]
pub enum Field<'a> {
    /// A value stored on the parent.
    Stored(&'a Value),
    /// A stored object or list of objects, wrapped as its declared type.
    Nested(Resolved),
    /// A computed field, ready to invoke.
    Computed(ComputedField),
}

/// An object value of a declared type.
///
/// Holds the original parent untouched; computed fields close over it and
/// shadow stored fields of the same name.
#[derive(Debug, Clone)]
pub struct WrappedObject {
    type_name: Arc<str>,
    parent: Arc<Value>,
    catalog: Arc<Catalog>,
}

impl WrappedObject {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The original value this object wraps.
    pub fn parent(&self) -> &Value {
        &self.parent
    }

    fn compiled(&self) -> Option<&CompiledType> {
        self.catalog.types.get(&*self.type_name)
    }

    /// Look up a field; computed fields take precedence over stored ones.
    ///
    /// Stored fields declared as a registered type (or a list of one) come
    /// back wrapped, so their own computed fields stay reachable.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::ShapeMismatch` when a stored value does not
    /// fit the declared object or list shape.
    pub fn get(&self, name: &str) -> Result<Option<Field<'_>>, ResolveError> {
        if let Some(field) = self.computed(name) {
            return Ok(Some(Field::Computed(field)));
        }
        let Some(value) = self.parent.get(name) else {
            return Ok(None);
        };
        match self.compiled().and_then(|t| t.nested(name)) {
            Some(node) => {
                let target = format!("{}.{}", self.type_name, name);
                let resolved = wrap_raw(&self.catalog, value.clone(), node, &target)?;
                Ok(Some(Field::Nested(resolved)))
            }
            None => Ok(Some(Field::Stored(value))),
        }
    }

    /// A computed field bound to this object's parent value.
    pub fn computed(&self, name: &str) -> Option<ComputedField> {
        let field = self.compiled()?.field(name)?;
        Some(ComputedField {
            type_name: self.type_name.clone(),
            parent: self.parent.clone(),
            field: field.clone(),
            catalog: self.catalog.clone(),
        })
    }

    /// Names of every computed field, in declaration order.
    pub fn computed_names(&self) -> Vec<&str> {
        self.compiled()
            .map(|t| t.fields.iter().map(|f| f.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Invoke a computed field by name.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::UnknownField` when the type declares no such
    /// computed field, or whatever the field invocation itself rejects with.
    pub async fn call(&self, name: &str, args: Value) -> Result<Resolved, ResolveError> {
        let field = self.computed(name).ok_or_else(|| ResolveError::UnknownField {
            type_name: self.type_name.to_string(),
            field: name.to_string(),
        })?;
        field.invoke(args).await
    }
}

/// A computed field closed over one parent value.
#[derive(Debug, Clone)]
pub struct ComputedField {
    type_name: Arc<str>,
    parent: Arc<Value>,
    field: Arc<CompiledField>,
    catalog: Arc<Catalog>,
}

impl ComputedField {
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Validate `args`, run the implementation with the parent, and wrap
    /// the result as the declared return type.
    pub async fn invoke(&self, args: Value) -> Result<Resolved, ResolveError> {
        let target = format!("{}.{}", self.type_name, self.field.name);
        debug!(field = %target, "invoking computed field");

        let args = validate_args(&target, self.field.def.signature.args.as_ref(), &args)?;
        let Some(resolver) = &self.field.def.resolver else {
            return Err(ResolveError::Unimplemented { target });
        };

        let raw = resolver(Value::clone(&self.parent), args)
            .await
            .map_err(|source| ResolveError::Resolver {
                target: target.clone(),
                source,
            })?;

        wrap_raw(&self.catalog, raw, &self.field.returns, &target)
    }
}

/// Validate arguments against an optional argument schema.
///
/// With no schema declared nothing is checked and the empty object is passed on.
pub(crate) fn validate_args(
    target: &str,
    schema: Option<&crate::schema::ObjectSchema>,
    args: &Value,
) -> Result<Value, ResolveError> {
    let Some(schema) = schema else {
        return Ok(Value::Object(Default::default()));
    };
    schema.parse(args).map_err(|errors| {
        debug!(address = %target, errors = errors.len(), "arguments rejected");
        ResolveError::InvalidArguments {
            target: target.to_string(),
            errors,
        }
    })
}

/// Wrap `raw` according to `node`.
///
/// # Errors
///
/// Returns `ResolveError::ShapeMismatch` when a list node meets a non-list
/// value or an object node meets a non-object value. `null` is never a
/// mismatch.
pub fn wrap_raw(
    catalog: &Arc<Catalog>,
    raw: Value,
    node: &AstNode,
    target: &str,
) -> Result<Resolved, ResolveError> {
    match &node.kind {
        AstKind::Array(inside) => match raw {
            Value::Array(items) => {
                trace!(address = %target, len = items.len(), "wrapping list");
                items
                    .into_iter()
                    .map(|item| wrap_raw(catalog, item, inside, target))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Resolved::List)
            }
            Value::Null => Ok(Resolved::Value(Value::Null)),
            other => Err(mismatch(target, "a list", &other)),
        },
        AstKind::Object { name } => match raw {
            Value::Object(_) => {
                trace!(address = %target, type_name = %name, "wrapping object");
                let type_name = catalog
                    .types
                    .get(name)
                    .map(|t| t.name.clone())
                    .ok_or_else(|| ResolveError::UnknownType {
                        target: target.to_string(),
                        type_name: name.clone(),
                    })?;
                Ok(Resolved::Object(WrappedObject {
                    type_name,
                    parent: Arc::new(raw),
                    catalog: catalog.clone(),
                }))
            }
            Value::Null => Ok(Resolved::Value(Value::Null)),
            other => Err(mismatch(target, "an object", &other)),
        },
        AstKind::FieldResolver { returns, .. } => wrap_raw(catalog, raw, returns, target),
        AstKind::String | AstKind::Number | AstKind::Boolean => Ok(Resolved::Value(raw)),
    }
}

fn reaches_object(node: &AstNode) -> bool {
    match &node.kind {
        AstKind::Object { .. } => true,
        AstKind::Array(inside) => reaches_object(inside),
        AstKind::FieldResolver { .. } | AstKind::String | AstKind::Number | AstKind::Boolean => {
            false
        }
    }
}

fn mismatch(target: &str, expected: &'static str, actual: &Value) -> ResolveError {
    ResolveError::ShapeMismatch {
        target: target.to_string(),
        expected,
        actual: json_type_name(actual),
    }
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::FieldDef;
    use crate::schema::{ObjectSchema, Schema};
    use serde_json::json;

    fn catalog() -> Arc<Catalog> {
        let user = ObjectSchema::new([("id", Schema::string()), ("name", Schema::string())]);
        let def = TypeDef::new(user.clone()).field(
            "upper",
            FieldDef::from_fn(Schema::string(), |parent, _| {
                Ok(json!(parent["name"].as_str().unwrap_or_default().to_uppercase()))
            }),
        );
        let base = [
            ("id".to_string(), AstNode::new(AstKind::String)),
            ("name".to_string(), AstNode::new(AstKind::String)),
        ];
        let upper = AstNode::field_resolver(None, AstNode::new(AstKind::String));

        let team = ObjectSchema::new([
            ("name", Schema::string()),
            ("lead", Schema::object(user.clone())),
            ("members", Schema::array(&user)),
        ]);
        let team_base = [
            ("name".to_string(), AstNode::new(AstKind::String)),
            ("lead".to_string(), AstNode::object("User")),
            ("members".to_string(), AstNode::array(AstNode::object("User"))),
        ];

        let mut catalog = Catalog::default();
        catalog.insert("User", &def, &base, vec![upper]);
        catalog.insert("Team", &TypeDef::new(team), &team_base, vec![]);
        Arc::new(catalog)
    }

    #[test]
    fn leaf_is_returned_unchanged() {
        let catalog = catalog();
        let leaf = AstNode::new(AstKind::String);
        let once = wrap_raw(&catalog, json!("a"), &leaf, "t").unwrap();
        let twice = wrap_raw(&catalog, once.to_plain(), &leaf, "t").unwrap();
        assert_eq!(once.as_value(), Some(&json!("a")));
        assert_eq!(twice.as_value(), once.as_value());
    }

    #[test]
    fn leaf_does_not_check_value_kind() {
        let catalog = catalog();
        let node = AstNode::new(AstKind::Number);
        let resolved = wrap_raw(&catalog, json!({ "a": 1 }), &node, "t").unwrap();
        assert_eq!(resolved.to_plain(), json!({ "a": 1 }));
    }

    #[test]
    fn list_keeps_length_and_order() {
        let catalog = catalog();
        let node = AstNode::array(AstNode::object("User"));
        let raw = json!([{ "id": "1", "name": "a" }, { "id": "2", "name": "b" }, null]);
        let resolved = wrap_raw(&catalog, raw.clone(), &node, "t").unwrap();
        let items = resolved.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_object().unwrap().parent()["id"], "1");
        assert_eq!(items[1].as_object().unwrap().parent()["id"], "2");
        assert!(items[2].is_null());
        assert_eq!(resolved.to_plain(), raw);
    }

    #[test]
    fn null_object_short_circuits() {
        let catalog = catalog();
        let resolved = wrap_raw(&catalog, Value::Null, &AstNode::object("User"), "t").unwrap();
        assert!(resolved.is_null());
        assert!(resolved.as_object().is_none());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let catalog = catalog();
        let err = wrap_raw(&catalog, json!("x"), &AstNode::object("User"), "Query.me").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ShapeMismatch { expected: "an object", actual: "string", .. }
        ));
        let node = AstNode::array(AstNode::object("User"));
        let err = wrap_raw(&catalog, json!(1), &node, "t").unwrap_err();
        assert!(matches!(err, ResolveError::ShapeMismatch { expected: "a list", .. }));
    }

    #[test]
    fn computed_fields_shadow_stored_fields() {
        let catalog = catalog();
        let raw = json!({ "id": "1", "name": "a", "upper": "stored" });
        let resolved = wrap_raw(&catalog, raw, &AstNode::object("User"), "t").unwrap();
        let object = resolved.as_object().unwrap();

        assert!(matches!(object.get("upper"), Ok(Some(Field::Computed(_)))));
        assert!(matches!(object.get("name"), Ok(Some(Field::Stored(v))) if v == "a"));
        assert!(matches!(object.get("missing"), Ok(None)));
        assert_eq!(object.computed_names(), ["upper"]);
        // the parent is kept as given
        assert_eq!(object.parent()["upper"], "stored");
    }

    #[tokio::test]
    async fn computed_field_runs_against_parent() {
        let catalog = catalog();
        let raw = json!({ "id": "1", "name": "ab" });
        let resolved = wrap_raw(&catalog, raw, &AstNode::object("User"), "t").unwrap();
        let upper = resolved.as_object().unwrap().call("upper", Value::Null).await.unwrap();
        assert_eq!(upper.as_value(), Some(&json!("AB")));
    }

    #[tokio::test]
    async fn unknown_computed_field() {
        let catalog = catalog();
        let raw = json!({ "id": "1", "name": "a" });
        let resolved = wrap_raw(&catalog, raw, &AstNode::object("User"), "t").unwrap();
        let err = resolved.as_object().unwrap().call("id", json!({})).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownField { field, .. } if field == "id"));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let catalog = catalog();
        let err = wrap_raw(&catalog, json!({}), &AstNode::object("Ghost"), "Query.me").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnknownType { target, type_name }
                if target == "Query.me" && type_name == "Ghost"
        ));
    }

    #[tokio::test]
    async fn stored_object_fields_are_wrapped() {
        let catalog = catalog();
        let raw = json!({
            "name": "core",
            "lead": { "id": "1", "name": "ab" },
            "members": [{ "id": "2", "name": "cd" }, null]
        });
        let resolved = wrap_raw(&catalog, raw, &AstNode::object("Team"), "t").unwrap();
        let team = resolved.as_object().unwrap();

        assert!(matches!(team.get("name"), Ok(Some(Field::Stored(v))) if v == "core"));

        let Ok(Some(Field::Nested(lead))) = team.get("lead") else {
            panic!("lead should be wrapped");
        };
        let lead = lead.as_object().unwrap();
        assert_eq!(lead.type_name(), "User");
        let upper = lead.call("upper", json!({})).await.unwrap();
        assert_eq!(upper.as_value(), Some(&json!("AB")));

        let Ok(Some(Field::Nested(members))) = team.get("members") else {
            panic!("members should be wrapped");
        };
        let members = members.as_list().unwrap();
        assert_eq!(members.len(), 2);
        let upper = members[0].as_object().unwrap().call("upper", json!({})).await.unwrap();
        assert_eq!(upper.as_value(), Some(&json!("CD")));
        assert!(members[1].is_null());
    }

    #[test]
    fn stored_object_field_with_wrong_shape() {
        let catalog = catalog();
        let resolved =
            wrap_raw(&catalog, json!({ "lead": "nobody" }), &AstNode::object("Team"), "t").unwrap();
        let err = resolved.as_object().unwrap().get("lead").unwrap_err();
        assert!(matches!(err, ResolveError::ShapeMismatch { target, .. } if target == "Team.lead"));
    }
}
