//! Validation schemas: the declared shape of every value that crosses a resolver.
//!
//! A [`Schema`] is a closed set of kinds. Its variant is the kind tag the
//! converter dispatches on. Object schemas carry a stable [`SchemaId`] so they
//! can be registered by name and found again while descending into a field.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde_json::{json, Map, Value};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an [`ObjectSchema`] instance.
///
/// Clones of an object schema share its id; two object schemas built
/// separately never do, even when their fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl SchemaId {
    fn next() -> Self {
        SchemaId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A validation schema node.
#[derive(Debug, Clone)]
pub enum Schema {
    String,
    Number,
    Boolean,
    /// Accepts any JSON value. Has no SDL counterpart.
    Any,
    Array(Box<Schema>),
    Object(ObjectSchema),
    /// May be `null`.
    Nullable(Box<Schema>),
    /// May be omitted from its enclosing object.
    Optional(Box<Schema>),
    /// Any one of the variants. Has no SDL counterpart.
    Union(Vec<Schema>),
}

impl Schema {
    pub fn string() -> Self {
        Schema::String
    }

    pub fn number() -> Self {
        Schema::Number
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn any() -> Self {
        Schema::Any
    }

    pub fn array(element: impl Into<Schema>) -> Self {
        Schema::Array(Box::new(element.into()))
    }

    pub fn object(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }

    pub fn union(variants: impl IntoIterator<Item = Schema>) -> Self {
        Schema::Union(variants.into_iter().collect())
    }

    /// Wrap this schema so `null` is accepted.
    pub fn nullable(self) -> Self {
        Schema::Nullable(Box::new(self))
    }

    /// Wrap this schema so its field may be left out.
    pub fn optional(self) -> Self {
        Schema::Optional(Box::new(self))
    }

    /// Short name of this node's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Schema::String => "string",
            Schema::Number => "number",
            Schema::Boolean => "boolean",
            Schema::Any => "any",
            Schema::Array(_) => "array",
            Schema::Object(_) => "object",
            Schema::Nullable(_) => "nullable",
            Schema::Optional(_) => "optional",
            Schema::Union(_) => "union",
        }
    }

    /// True when an `Optional` modifier appears before any concrete kind.
    pub fn is_optional(&self) -> bool {
        match self {
            Schema::Optional(_) => true,
            Schema::Nullable(inner) => inner.is_optional(),
            _ => false,
        }
    }

    /// Render this schema as a JSON Schema document.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::String => json!({ "type": "string" }),
            Schema::Number => json!({ "type": "number" }),
            Schema::Boolean => json!({ "type": "boolean" }),
            Schema::Any => json!({}),
            Schema::Array(items) => json!({ "type": "array", "items": items.to_json_schema() }),
            Schema::Object(object) => object.to_json_schema(),
            Schema::Nullable(inner) => {
                json!({ "anyOf": [inner.to_json_schema(), { "type": "null" }] })
            }
            // Presence is handled by the enclosing object's `required` list
            Schema::Optional(inner) => inner.to_json_schema(),
            Schema::Union(variants) => json!({
                "anyOf": variants.iter().map(Schema::to_json_schema).collect::<Vec<_>>()
            }),
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

impl From<&ObjectSchema> for Schema {
    fn from(object: &ObjectSchema) -> Self {
        Schema::Object(object.clone())
    }
}

/// An object schema with ordered, named fields.
///
/// Cheap to clone: clones share the field list, the identity and the
/// compiled validator.
#[derive(Clone)]
pub struct ObjectSchema {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    id: SchemaId,
    fields: Vec<(String, Schema)>,
    validator: OnceLock<Result<jsonschema::Validator, String>>,
}

impl ObjectSchema {
    /// Create an object schema from `(name, schema)` pairs, keeping their order.
    pub fn new<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self {
            inner: Arc::new(ObjectInner {
                id: SchemaId::next(),
                fields: fields
                    .into_iter()
                    .map(|(name, schema)| (name.into(), schema))
                    .collect(),
                validator: OnceLock::new(),
            }),
        }
    }

    pub fn id(&self) -> SchemaId {
        self.inner.id
    }

    pub fn fields(&self) -> &[(String, Schema)] {
        &self.inner.fields
    }

    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.inner
            .fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, schema)| schema)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    /// Render this object as a JSON Schema document.
    ///
    /// Unknown properties are allowed; they are stripped after validation.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, schema) in self.fields() {
            properties.insert(name.clone(), schema.to_json_schema());
            if !schema.is_optional() {
                required.push(Value::String(name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub(crate) fn compiled_validator(&self) -> &Result<jsonschema::Validator, String> {
        self.inner.validator.get_or_init(|| {
            jsonschema::validator_for(&self.to_json_schema()).map_err(|e| e.to_string())
        })
    }
}

impl PartialEq for ObjectSchema {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ObjectSchema {}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("id", &self.inner.id)
            .field("fields", &self.inner.fields)
            .finish()
    }
}
