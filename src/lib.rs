//! Yoko
//!
//! Declare data shapes once and derive both a GraphQL schema (SDL text) and
//! a root value of validated, async resolvers from that one declaration.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use yoko::{yoko, Declarations, FieldDef, ObjectSchema, ResolverDef, Schema, TypeDef};
//!
//! let user = ObjectSchema::new([("id", Schema::string()), ("name", Schema::string())]);
//!
//! let user_type = TypeDef::new(user.clone()).field(
//!     "upper",
//!     FieldDef::from_fn(Schema::string(), |parent, _| {
//!         Ok(json!(parent["name"].as_str().unwrap_or_default().to_uppercase()))
//!     }),
//! );
//!
//! let get_user = ResolverDef::from_fn(user.clone(), |args| {
//!     Ok(json!({ "id": args["id"], "name": "a" }))
//! })
//! .args(ObjectSchema::new([("id", Schema::string())]));
//!
//! let built = yoko(
//!     Declarations::new()
//!         .with_type("User", user_type)
//!         .query("getUser", get_user),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     built.schema,
//!     "type User {\n  id: String!\n  name: String!\n  upper: String!\n}\n\
//!      type Query {\n  getUser(id: String!): User!\n}"
//! );
//!
//! use futures::executor::block_on;
//!
//! let user = block_on(built.root_value.invoke("getUser", json!({ "id": "1" }))).unwrap();
//! let upper = block_on(user.as_object().unwrap().call("upper", json!({}))).unwrap();
//! assert_eq!(upper.as_value(), Some(&json!("A")));
//! ```
//!
//! # Type mapping
//!
//! | Schema | SDL |
//! |--------|-----|
//! | `string` | `String!` |
//! | `number` | `Int!` |
//! | `boolean` | `Boolean!` |
//! | `array(T)` | `[T]!` |
//! | registered object | `Name!` |
//! | `nullable(T)` / `optional(T)` | `T` without `!` |
//!
//! `any` and `union` have no SDL form and fail conversion.

mod ast;
mod builder;
mod converter;
mod define;
mod error;
pub mod logging;
mod manifest;
mod registry;
mod schema;
mod validate;
mod wrap;

pub use ast::{stringify_ast_node, AstKind, AstNode};
pub use builder::{yoko, Declarations, Operation, OperationKind, RootValue, Yoko};
pub use converter::{ConvertedType, Converter};
pub use define::{
    define_resolver, define_type, FieldDef, FieldFn, OperationFn, ResolverDef, Signature, TypeDef,
};
pub use error::{BoxError, ConvertError, ManifestError, ResolveError, SchemaError};
pub use manifest::{
    is_url, load_manifest, load_manifest_auto, load_manifest_str, parse_manifest,
    validate_arguments,
};
pub use registry::{invert, TypeRegistry};
pub use schema::{ObjectSchema, Schema, SchemaId};
pub use validate::validate_against_schema;
pub use wrap::{wrap_raw, Catalog, ComputedField, Field, Resolved, WrappedObject};

#[cfg(feature = "remote")]
pub use manifest::load_manifest_url;
