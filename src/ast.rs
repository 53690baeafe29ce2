//! Intermediate representation shared by SDL generation and value wrapping.

use std::fmt;

use crate::schema::ObjectSchema;

/// A typed node with its nullability flag.
#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: AstKind,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub enum AstKind {
    /// Reference to a registered type by name.
    Object { name: String },
    Array(Box<AstNode>),
    String,
    Number,
    Boolean,
    /// A computed field or operation: optional argument shape plus return type.
    FieldResolver {
        args: Option<ObjectSchema>,
        returns: Box<AstNode>,
    },
}

impl AstNode {
    pub fn new(kind: AstKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(AstKind::Object { name: name.into() })
    }

    pub fn array(inside: AstNode) -> Self {
        Self::new(AstKind::Array(Box::new(inside)))
    }

    /// A field resolver node. Always nullable: its return type carries the
    /// required marker instead.
    pub fn field_resolver(args: Option<ObjectSchema>, returns: AstNode) -> Self {
        Self {
            kind: AstKind::FieldResolver {
                args,
                returns: Box::new(returns),
            },
            nullable: true,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Name of the referenced type, for object nodes.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            AstKind::Object { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AstKind::Object { name } => write!(f, "{}", name)?,
            AstKind::Array(inside) => write!(f, "[{}]", inside)?,
            AstKind::FieldResolver { returns, .. } => write!(f, "{}", returns)?,
            AstKind::String => f.write_str("String")?,
            AstKind::Number => f.write_str("Int")?,
            AstKind::Boolean => f.write_str("Boolean")?,
        }
        if !self.nullable {
            f.write_str("!")?;
        }
        Ok(())
    }
}

/// Render a node as an SDL type reference.
pub fn stringify_ast_node(node: &AstNode) -> String {
    node.to_string()
}
