//! Declaration manifests: types and operation signatures loaded from JSON.
//!
//! A manifest declares the same things the programmatic API does, minus
//! implementations:
//!
//! ```json
//! {
//!   "types": {
//!     "User": {
//!       "fields": { "id": { "type": "string" } },
//!       "resolvers": {
//!         "hobbies": { "returns": { "type": "array", "items": { "$ref": "Hobby" } } }
//!       }
//!     },
//!     "Hobby": { "fields": { "id": { "type": "string" } } }
//!   },
//!   "queries": {
//!     "getUser": { "args": { "id": { "type": "string" } }, "returns": { "$ref": "User" } }
//!   }
//! }
//! ```
//!
//! Base shapes may reference each other as long as they do not form a cycle.
//! Resolver and operation return types may reference any declared type.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::{Map, Value};

use crate::builder::Declarations;
use crate::define::{FieldDef, ResolverDef, Signature, TypeDef};
use crate::error::ManifestError;
use crate::schema::{ObjectSchema, Schema};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a manifest from a file path.
///
/// # Errors
///
/// Returns `ManifestError::FileNotFound` if the file doesn't exist,
/// `ManifestError::InvalidJson` if it isn't valid JSON, or a declaration
/// error if the content doesn't describe a valid declaration set.
pub fn load_manifest(path: &Path) -> Result<Declarations, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_manifest_str(&content)
}

/// Load a manifest from a JSON string.
pub fn load_manifest_str(content: &str) -> Result<Declarations, ManifestError> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| ManifestError::InvalidJson { source })?;
    parse_manifest(&value)
}

/// Load a manifest from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
pub fn load_manifest_url(url: &str) -> Result<Declarations, ManifestError> {
    let network = |source| ManifestError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    let value: Value = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network)?;

    parse_manifest(&value)
}

/// Load a manifest from a file path or, with the `remote` feature, a URL.
pub fn load_manifest_auto(source: &str) -> Result<Declarations, ManifestError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_manifest_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ManifestError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_manifest(Path::new(source))
    }
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Build declarations from a parsed manifest document.
///
/// Every field and operation is declared by signature only.
pub fn parse_manifest(manifest: &Value) -> Result<Declarations, ManifestError> {
    let root = expect_object(manifest, "")?;
    let types = optional_section(root, "types", "")?;
    let queries = optional_section(root, "queries", "")?;
    let mutations = optional_section(root, "mutations", "")?;

    let shapes = build_shapes(&types)?;

    let mut declarations = Declarations::new();
    for (name, body) in &types {
        let path = format!("/types/{}", name);
        let body = expect_object(body, &path)?;
        let Some(shape) = shapes.get(name.as_str()) else {
            continue;
        };

        let mut def = TypeDef::new(shape.clone());
        for (field, spec) in &optional_section(body, "resolvers", &path)? {
            let field_path = format!("{}/resolvers/{}", path, field);
            let signature = parse_signature(spec, &field_path, &shapes)?;
            def = def.field(field.clone(), FieldDef::unimplemented(signature));
        }
        declarations = declarations.with_type(name.clone(), def);
    }

    for (name, spec) in &queries {
        let signature = parse_signature(spec, &format!("/queries/{}", name), &shapes)?;
        declarations = declarations.query(name.clone(), ResolverDef::unimplemented(signature));
    }
    for (name, spec) in &mutations {
        let signature = parse_signature(spec, &format!("/mutations/{}", name), &shapes)?;
        declarations = declarations.mutation(name.clone(), ResolverDef::unimplemented(signature));
    }

    Ok(declarations)
}

/// Validate an argument payload against a declared signature.
///
/// `address` names an operation (`getUser`) or a computed field
/// (`User.hobbies`). Signatures without arguments accept anything and
/// yield the empty object.
///
/// # Errors
///
/// Returns `ManifestError::InvalidDeclaration` for an unknown address and
/// `ManifestError::InvalidArguments` when the payload is rejected.
pub fn validate_arguments(
    declarations: &Declarations,
    address: &str,
    payload: &Value,
) -> Result<Value, ManifestError> {
    let signature = declarations
        .signature(address)
        .ok_or_else(|| invalid(address, "no such operation or computed field"))?;

    match &signature.args {
        Some(args) => args
            .parse(payload)
            .map_err(|errors| ManifestError::InvalidArguments { errors }),
        None => Ok(Value::Object(Map::new())),
    }
}

// --- Internal implementation ---

/// Build every base shape, dependencies first.
fn build_shapes(
    types: &Map<String, Value>,
) -> Result<HashMap<String, ObjectSchema>, ManifestError> {
    let mut dependencies: HashMap<&str, Vec<String>> = HashMap::new();
    for (name, body) in types {
        let path = format!("/types/{}", name);
        let fields = optional_section(expect_object(body, &path)?, "fields", &path)?;
        let mut refs = Vec::new();
        for (field, node) in &fields {
            collect_refs(node, &format!("{}/fields/{}", path, field), types, &mut refs)?;
        }
        dependencies.insert(name.as_str(), refs);
    }

    let mut order = Vec::new();
    let mut done = HashSet::new();
    for name in types.keys() {
        visit(name, &dependencies, &mut done, &mut Vec::new(), &mut order)?;
    }

    let mut shapes = HashMap::new();
    for name in order {
        let path = format!("/types/{}", name);
        let body = expect_object(&types[name.as_str()], &path)?;
        let mut fields = Vec::new();
        for (field, node) in &optional_section(body, "fields", &path)? {
            let schema = parse_node(node, &format!("{}/fields/{}", path, field), &shapes)?;
            fields.push((field.clone(), schema));
        }
        shapes.insert(name, ObjectSchema::new(fields));
    }

    Ok(shapes)
}

/// Depth-first topological visit; `stack` holds the current path for cycle reports.
fn visit(
    name: &str,
    dependencies: &HashMap<&str, Vec<String>>,
    done: &mut HashSet<String>,
    stack: &mut Vec<String>,
    order: &mut Vec<String>,
) -> Result<(), ManifestError> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|n| n == name) {
        let mut names = stack[start..].to_vec();
        names.push(name.to_string());
        return Err(ManifestError::CyclicShape { names });
    }

    stack.push(name.to_string());
    for dependency in dependencies.get(name).into_iter().flatten() {
        visit(dependency, dependencies, done, stack, order)?;
    }
    stack.pop();

    done.insert(name.to_string());
    order.push(name.to_string());
    Ok(())
}

fn collect_refs(
    node: &Value,
    path: &str,
    types: &Map<String, Value>,
    refs: &mut Vec<String>,
) -> Result<(), ManifestError> {
    match node {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref") {
                let name = reference_name(reference, path)?;
                if !types.contains_key(name) {
                    return Err(ManifestError::UnknownReference {
                        path: path.to_string(),
                        name: name.to_string(),
                    });
                }
                refs.push(name.to_string());
            }
            for (key, child) in map {
                if key == "items" || key == "anyOf" {
                    collect_refs(child, &format!("{}/{}", path, key), types, refs)?;
                }
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_refs(item, &format!("{}/{}", path, i), types, refs)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_signature(
    spec: &Value,
    path: &str,
    shapes: &HashMap<String, ObjectSchema>,
) -> Result<Signature, ManifestError> {
    let spec = expect_object(spec, path)?;
    let returns = spec.get("returns").ok_or_else(|| ManifestError::InvalidDeclaration {
        path: path.to_string(),
        message: "missing \"returns\"".to_string(),
    })?;
    let mut signature = Signature::new(parse_node(returns, &format!("{}/returns", path), shapes)?);

    if let Some(args) = spec.get("args") {
        let args_path = format!("{}/args", path);
        let mut fields = Vec::new();
        for (name, node) in expect_object(args, &args_path)? {
            let schema = parse_node(node, &format!("{}/{}", args_path, name), shapes)?;
            fields.push((name.clone(), schema));
        }
        signature = signature.with_args(ObjectSchema::new(fields));
    }

    Ok(signature)
}

fn parse_node(
    node: &Value,
    path: &str,
    shapes: &HashMap<String, ObjectSchema>,
) -> Result<Schema, ManifestError> {
    let map = expect_object(node, path)?;

    let mut schema = if let Some(reference) = map.get("$ref") {
        let name = reference_name(reference, path)?;
        let shape = shapes.get(name).ok_or_else(|| ManifestError::UnknownReference {
            path: path.to_string(),
            name: name.to_string(),
        })?;
        Schema::object(shape.clone())
    } else if let Some(variants) = map.get("anyOf") {
        let variants = variants
            .as_array()
            .ok_or_else(|| invalid(path, "\"anyOf\" must be an array"))?;
        let mut parsed = Vec::new();
        for (i, variant) in variants.iter().enumerate() {
            parsed.push(parse_node(variant, &format!("{}/anyOf/{}", path, i), shapes)?);
        }
        Schema::union(parsed)
    } else {
        match map.get("type").and_then(Value::as_str) {
            Some("string") => Schema::string(),
            Some("number") => Schema::number(),
            Some("boolean") => Schema::boolean(),
            Some("any") => Schema::any(),
            Some("array") => {
                let items = map
                    .get("items")
                    .ok_or_else(|| invalid(path, "array without \"items\""))?;
                Schema::array(parse_node(items, &format!("{}/items", path), shapes)?)
            }
            Some(other) => return Err(invalid(path, &format!("unknown type \"{}\"", other))),
            None => return Err(invalid(path, "expected \"type\", \"$ref\" or \"anyOf\"")),
        }
    };

    if flag(map, "nullable", path)? {
        schema = schema.nullable();
    }
    if flag(map, "optional", path)? {
        schema = schema.optional();
    }
    Ok(schema)
}

fn reference_name<'a>(reference: &'a Value, path: &str) -> Result<&'a str, ManifestError> {
    reference
        .as_str()
        .ok_or_else(|| invalid(path, "\"$ref\" must be a type name"))
}

fn flag(map: &Map<String, Value>, key: &str, path: &str) -> Result<bool, ManifestError> {
    match map.get(key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(path, &format!("\"{}\" must be a boolean", key))),
    }
}

fn optional_section(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Map<String, Value>, ManifestError> {
    match map.get(key) {
        None => Ok(Map::new()),
        Some(Value::Object(section)) => Ok(section.clone()),
        Some(_) => Err(invalid(&format!("{}/{}", path, key), "expected an object")),
    }
}

fn expect_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, ManifestError> {
    value.as_object().ok_or_else(|| invalid(path, "expected an object"))
}

fn invalid(path: &str, message: &str) -> ManifestError {
    ManifestError::InvalidDeclaration {
        path: path.to_string(),
        message: message.to_string(),
    }
}
