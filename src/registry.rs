//! Type registry: reverse lookup from an object schema to its declared name.

use std::collections::HashMap;

use crate::error::ConvertError;
use crate::schema::{ObjectSchema, SchemaId};

/// Maps each registered object schema's identity to the name it was declared under.
///
/// Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    names: HashMap<SchemaId, String>,
    order: Vec<String>,
}

/// Build a registry from `(name, shape)` pairs.
///
/// # Errors
///
/// Returns `ConvertError::DuplicateName` if a name repeats, and
/// `ConvertError::DuplicateSchema` if one schema instance is declared under
/// two names.
pub fn invert<'a, I>(entities: I) -> Result<TypeRegistry, ConvertError>
where
    I: IntoIterator<Item = (&'a str, &'a ObjectSchema)>,
{
    let mut registry = TypeRegistry::default();

    for (name, shape) in entities {
        if registry.order.iter().any(|n| n == name) {
            return Err(ConvertError::DuplicateName {
                name: name.to_string(),
            });
        }
        if let Some(first) = registry.names.get(&shape.id()) {
            return Err(ConvertError::DuplicateSchema {
                first: first.clone(),
                second: name.to_string(),
            });
        }
        registry.names.insert(shape.id(), name.to_string());
        registry.order.push(name.to_string());
    }

    Ok(registry)
}

impl TypeRegistry {
    /// Declared name of `shape`, if it was registered.
    pub fn name_of(&self, shape: &ObjectSchema) -> Option<&str> {
        self.names.get(&shape.id()).map(String::as_str)
    }

    pub fn contains(&self, shape: &ObjectSchema) -> bool {
        self.names.contains_key(&shape.id())
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
