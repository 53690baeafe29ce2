//! Conversion of declarations into AST nodes and SDL text.

use crate::ast::{AstKind, AstNode};
use crate::define::{ResolverDef, Signature, TypeDef};
use crate::error::ConvertError;
use crate::registry::TypeRegistry;
use crate::schema::{ObjectSchema, Schema};

/// A declared type after conversion.
#[derive(Debug, Clone)]
pub struct ConvertedType {
    pub name: String,
    /// One node per SDL field: base fields first, computed fields after.
    pub fields: Vec<(String, AstNode)>,
    /// Field resolver node of each computed field, in declaration order.
    pub computed: Vec<AstNode>,
}

/// Converts validation schemas against a fixed registry of named types.
#[derive(Debug, Clone)]
pub struct Converter {
    registry: TypeRegistry,
}

impl Converter {
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Convert a schema node into an AST node.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::UnregisteredType` for an object schema missing
    /// from the registry and `ConvertError::UnsupportedType` for kinds with
    /// no SDL counterpart.
    pub fn node_from_schema(&self, schema: &Schema) -> Result<AstNode, ConvertError> {
        self.convert(schema, "<root>")
    }

    fn convert(&self, schema: &Schema, path: &str) -> Result<AstNode, ConvertError> {
        match schema {
            Schema::String => Ok(AstNode::new(AstKind::String)),
            Schema::Number => Ok(AstNode::new(AstKind::Number)),
            Schema::Boolean => Ok(AstNode::new(AstKind::Boolean)),
            Schema::Array(items) => {
                let inside = self.convert(items, &format!("{}[]", path))?;
                Ok(AstNode::array(inside))
            }
            Schema::Object(object) => match self.registry.name_of(object) {
                Some(name) => Ok(AstNode::object(name)),
                None => Err(ConvertError::UnregisteredType {
                    path: path.to_string(),
                }),
            },
            Schema::Nullable(inner) | Schema::Optional(inner) => {
                Ok(self.convert(inner, path)?.with_nullable(true))
            }
            Schema::Any | Schema::Union(_) => Err(ConvertError::UnsupportedType {
                kind: schema.kind_name().to_string(),
                path: path.to_string(),
            }),
        }
    }

    /// Convert every field of an object shape, in order.
    pub fn shape_nodes(
        &self,
        shape: &ObjectSchema,
        path: &str,
    ) -> Result<Vec<(String, AstNode)>, ConvertError> {
        shape
            .fields()
            .iter()
            .map(|(name, schema)| {
                let node = self.convert(schema, &format!("{}.{}", path, name))?;
                Ok((name.clone(), node))
            })
            .collect()
    }

    /// Render an argument shape as an SDL parameter list body, e.g. `id: String!, limit: Int`.
    pub fn convert_arguments(
        &self,
        args: &ObjectSchema,
        path: &str,
    ) -> Result<String, ConvertError> {
        let parameters = self.shape_nodes(args, path)?;
        Ok(parameters
            .iter()
            .map(|(name, node)| format!("{}: {}", name, node))
            .collect::<Vec<_>>()
            .join(", "))
    }

    /// Convert a signature into a field resolver node.
    pub fn field_resolver_node(
        &self,
        signature: &Signature,
        path: &str,
    ) -> Result<AstNode, ConvertError> {
        if let Some(args) = &signature.args {
            // Checked here so a bad argument shape fails conversion, not rendering
            self.shape_nodes(args, &format!("{}()", path))?;
        }
        let returns = self.convert(&signature.returns, path)?;
        Ok(AstNode::field_resolver(signature.args.clone(), returns))
    }

    /// Convert a declared type: base shape fields, then computed fields.
    ///
    /// A computed field named like a base field replaces it in place.
    pub fn convert_type(&self, name: &str, def: &TypeDef) -> Result<ConvertedType, ConvertError> {
        let mut fields = self.shape_nodes(&def.shape, name)?;
        let mut computed = Vec::with_capacity(def.fields.len());

        for (index, (field_name, field)) in def.fields.iter().enumerate() {
            if def.fields[..index].iter().any(|(n, _)| n == field_name) {
                return Err(ConvertError::DuplicateField {
                    type_name: name.to_string(),
                    field: field_name.clone(),
                });
            }
            let path = format!("{}.{}", name, field_name);
            let node = self.field_resolver_node(&field.signature, &path)?;
            match fields.iter_mut().find(|(n, _)| n == field_name) {
                Some(slot) => slot.1 = node.clone(),
                None => fields.push((field_name.clone(), node.clone())),
            }
            computed.push(node);
        }

        Ok(ConvertedType {
            name: name.to_string(),
            fields,
            computed,
        })
    }

    /// Render a declared type as an SDL `type` block.
    pub fn process_defined_type(&self, name: &str, def: &TypeDef) -> Result<String, ConvertError> {
        let converted = self.convert_type(name, def)?;
        self.render_block(&converted.name, &converted.fields)
    }

    /// Convert every operation in a root block into field resolver nodes.
    pub fn convert_resolver_map(
        &self,
        block_name: &str,
        operations: &[(String, ResolverDef)],
    ) -> Result<Vec<(String, AstNode)>, ConvertError> {
        operations
            .iter()
            .map(|(name, def)| {
                let path = format!("{}.{}", block_name, name);
                let node = self.field_resolver_node(&def.signature, &path)?;
                Ok((name.clone(), node))
            })
            .collect()
    }

    /// Render a root block (`Query`, `Mutation`). Empty maps render as `""`.
    pub fn process_resolver_map(
        &self,
        block_name: &str,
        operations: &[(String, ResolverDef)],
    ) -> Result<String, ConvertError> {
        let nodes = self.convert_resolver_map(block_name, operations)?;
        if nodes.is_empty() {
            return Ok(String::new());
        }
        self.render_block(block_name, &nodes)
    }

    /// Render a `type` block, one field per line.
    pub fn render_block(
        &self,
        type_name: &str,
        fields: &[(String, AstNode)],
    ) -> Result<String, ConvertError> {
        let mut lines = String::new();
        for (name, node) in fields {
            let parameters = match &node.kind {
                AstKind::FieldResolver { args: Some(args), .. } => {
                    let path = format!("{}.{}()", type_name, name);
                    format!("({})", self.convert_arguments(args, &path)?)
                }
                _ => String::new(),
            };
            lines.push_str(&format!("  {}{}: {}\n", name, parameters, node));
        }
        Ok(format!("type {} {{\n{}}}", type_name, lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define::FieldDef;
    use crate::registry::invert;
    use serde_json::json;

    fn user() -> ObjectSchema {
        ObjectSchema::new([("id", Schema::string()), ("name", Schema::string())])
    }

    fn converter_for(types: &[(&str, &ObjectSchema)]) -> Converter {
        Converter::new(invert(types.iter().copied()).unwrap())
    }

    #[test]
    fn primitives_are_required_by_default() {
        let converter = converter_for(&[]);
        let node = converter.node_from_schema(&Schema::string()).unwrap();
        assert!(matches!(node.kind, AstKind::String));
        assert!(!node.nullable);
        assert_eq!(converter.node_from_schema(&Schema::number()).unwrap().to_string(), "Int!");
        assert_eq!(converter.node_from_schema(&Schema::boolean()).unwrap().to_string(), "Boolean!");
    }

    #[test]
    fn modifiers_set_nullable_idempotently() {
        let converter = converter_for(&[]);
        let once = converter.node_from_schema(&Schema::string().nullable()).unwrap();
        let twice = converter
            .node_from_schema(&Schema::string().optional().nullable())
            .unwrap();
        assert!(once.nullable);
        assert!(twice.nullable);
        assert_eq!(twice.to_string(), "String");
    }

    #[test]
    fn array_wraps_element() {
        let user = user();
        let converter = converter_for(&[("User", &user)]);
        let node = converter
            .node_from_schema(&Schema::array(user.clone()).nullable())
            .unwrap();
        assert_eq!(node.to_string(), "[User!]");
    }

    #[test]
    fn unregistered_object_fails_with_path() {
        let converter = converter_for(&[]);
        let def = TypeDef::new(ObjectSchema::new([("friend", Schema::object(user()))]));
        let err = converter.process_defined_type("Person", &def).unwrap_err();
        assert!(matches!(err, ConvertError::UnregisteredType { path } if path == "Person.friend"));
    }

    #[test]
    fn unsupported_kind_fails() {
        let converter = converter_for(&[]);
        let err = converter
            .node_from_schema(&Schema::array(Schema::any()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedType { kind, path } if kind == "any" && path == "<root>[]"
        ));

        let err = converter
            .node_from_schema(&Schema::union([Schema::string(), Schema::number()]))
            .unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedType { kind, .. } if kind == "union"));
    }

    #[test]
    fn defined_type_block() {
        let user = user();
        let converter = converter_for(&[("User", &user)]);
        let def = TypeDef::new(user.clone())
            .field(
                "upper",
                FieldDef::from_fn(Schema::string(), |_, _| Ok(json!(""))),
            )
            .field(
                "greet",
                FieldDef::from_fn(Schema::string().nullable(), |_, _| Ok(json!("")))
                    .args(ObjectSchema::new([
                        ("greeting", Schema::string()),
                        ("times", Schema::number().optional()),
                    ])),
            );

        let block = converter.process_defined_type("User", &def).unwrap();
        assert_eq!(
            block,
            "type User {\n  id: String!\n  name: String!\n  upper: String!\n  greet(greeting: String!, times: Int): String\n}"
        );
    }

    #[test]
    fn computed_field_shadows_base_field_in_place() {
        let user = user();
        let converter = converter_for(&[("User", &user)]);
        let def = TypeDef::new(user.clone()).field(
            "name",
            FieldDef::from_fn(Schema::string().nullable(), |_, _| Ok(json!(""))),
        );
        let block = converter.process_defined_type("User", &def).unwrap();
        assert_eq!(block, "type User {\n  id: String!\n  name: String\n}");
    }

    #[test]
    fn duplicate_computed_field_rejected() {
        let user = user();
        let converter = converter_for(&[("User", &user)]);
        let def = TypeDef::new(user.clone())
            .field("x", FieldDef::from_fn(Schema::string(), |_, _| Ok(json!(""))))
            .field("x", FieldDef::from_fn(Schema::number(), |_, _| Ok(json!(1))));
        let err = converter.process_defined_type("User", &def).unwrap_err();
        assert!(matches!(err, ConvertError::DuplicateField { field, .. } if field == "x"));
    }

    #[test]
    fn resolver_map_block() {
        let user = user();
        let converter = converter_for(&[("User", &user)]);
        let queries = vec![
            (
                "getUser".to_string(),
                ResolverDef::from_fn(user.clone(), |_| Ok(json!(null)))
                    .args(ObjectSchema::new([("id", Schema::string())])),
            ),
            (
                "getUsers".to_string(),
                ResolverDef::from_fn(Schema::array(user.clone()), |_| Ok(json!([]))),
            ),
        ];
        let block = converter.process_resolver_map("Query", &queries).unwrap();
        assert_eq!(
            block,
            "type Query {\n  getUser(id: String!): User!\n  getUsers: [User!]!\n}"
        );
    }

    #[test]
    fn empty_resolver_map_renders_nothing() {
        let converter = converter_for(&[]);
        assert_eq!(converter.process_resolver_map("Mutation", &[]).unwrap(), "");
    }

    #[test]
    fn unregistered_argument_type_fails() {
        let converter = converter_for(&[]);
        let ops = vec![(
            "find".to_string(),
            ResolverDef::from_fn(Schema::string(), |_| Ok(json!("")))
                .args(ObjectSchema::new([("by", Schema::object(user()))])),
        )];
        let err = converter.process_resolver_map("Query", &ops).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnregisteredType { path } if path == "Query.find().by"
        ));
    }
}
