//! Error types for schema conversion, resolver invocation and manifest loading.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by caller-supplied resolver implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while converting declarations into SDL text.
///
/// Any of these aborts the whole `yoko` call; no partial schema is produced.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unregistered object type at {path}: declare it under a type name first")]
    UnregisteredType { path: String },

    #[error("unsupported schema kind \"{kind}\" at {path}")]
    UnsupportedType { kind: String, path: String },

    #[error("the same object schema is declared as both '{first}' and '{second}'")]
    DuplicateSchema { first: String, second: String },

    #[error("name '{name}' is declared more than once")]
    DuplicateName { name: String },

    #[error("field '{field}' is declared more than once on type '{type_name}'")]
    DuplicateField { type_name: String, field: String },
}

/// Errors raised while invoking an operation or a computed field.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid arguments for {target}: {}", join_errors(errors))]
    InvalidArguments {
        target: String,
        errors: Vec<SchemaError>,
    },

    #[error("{target} failed: {source}")]
    Resolver {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("{target} has no implementation")]
    Unimplemented { target: String },

    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },

    #[error("type '{type_name}' has no computed field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("{target} is declared as '{type_name}', which is not a declared type")]
    UnknownType { target: String, type_name: String },

    #[error("{target} returned {actual} where {expected} was declared")]
    ShapeMismatch {
        target: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors while loading a declaration manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Declaration errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid declaration at {path}: {message}")]
    InvalidDeclaration { path: String, message: String },

    #[error("unknown type reference \"{name}\" at {path}")]
    UnknownReference { path: String, name: String },

    #[error("base shapes reference each other in a cycle: {}", names.join(" -> "))]
    CyclicShape { names: Vec<String> },

    #[error(transparent)]
    Convert(#[from] ConvertError),

    // Payload errors (exit code 1)
    #[error("validation failed with {} error(s)", errors.len())]
    InvalidArguments { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ManifestError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ManifestError::FileNotFound { .. } | ManifestError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ManifestError::NetworkError { .. } => 3,
            ManifestError::InvalidArguments { .. } => 1,
            _ => 2,
        }
    }
}
