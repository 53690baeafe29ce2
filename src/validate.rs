//! Argument validation against object schemas.

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::{ObjectSchema, Schema};

impl ObjectSchema {
    /// Validate `input` and return the validated value.
    ///
    /// Every error is collected with its JSON Pointer path. On success the
    /// returned value holds only declared keys, at every depth. `null` input
    /// is read as the empty object.
    pub fn parse(&self, input: &Value) -> Result<Value, Vec<SchemaError>> {
        let empty = Value::Object(Map::new());
        let input = if input.is_null() { &empty } else { input };

        validate_against_schema(self, input)?;
        Ok(strip_unknown(&Schema::Object(self.clone()), input))
    }
}

/// Validate a payload against an object schema without transforming it.
pub fn validate_against_schema(
    schema: &ObjectSchema,
    payload: &Value,
) -> Result<(), Vec<SchemaError>> {
    let validator = schema.compiled_validator().as_ref().map_err(|message| {
        vec![SchemaError {
            path: String::new(),
            message: format!("invalid schema: {}", message),
        }]
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn strip_unknown(schema: &Schema, value: &Value) -> Value {
    match (schema, value) {
        (Schema::Object(object), Value::Object(map)) => {
            let mut result = Map::new();
            for (name, field) in object.fields() {
                if let Some(child) = map.get(name) {
                    result.insert(name.clone(), strip_unknown(field, child));
                }
            }
            Value::Object(result)
        }
        (Schema::Array(items), Value::Array(values)) => {
            Value::Array(values.iter().map(|v| strip_unknown(items, v)).collect())
        }
        (Schema::Nullable(inner) | Schema::Optional(inner), _) => strip_unknown(inner, value),
        // Unions and leaves pass through unchanged
        _ => value.clone(),
    }
}
