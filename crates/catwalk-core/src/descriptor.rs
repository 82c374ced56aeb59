//! Type descriptors — the declarative, JSON-Schema-like shape language
//! models use to describe their input and output.
//!
//! A descriptor is a finite tree:
//!
//! ```text
//! { "type": "object", "properties": {
//!     "inputs":  { "type": "array", "items": { "type": "number" } },
//!     "label":   { "type": "string", "nullable": true } } }
//! ```
//!
//! Parsing happens once, at mount time. Anything the parser does not
//! recognise is a `SchemaCompilationError`, never a request-time failure.

use serde_json::{Map, Value};
use thiserror::Error;

/// A parsed type descriptor node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// Also accept `null` (or an absent object key).
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    String,
    Boolean,
    /// `format` is informative only ("int32", "int64").
    Integer { format: Option<String> },
    /// `format` is informative only ("float32", "float64").
    Number { format: Option<String> },
    Array { items: Box<TypeDescriptor> },
    Object { properties: Vec<(String, TypeDescriptor)> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaCompilationError {
    #[error("{path}: descriptor must be an object")]
    NotAnObject { path: String },
    #[error("{path}: descriptor is missing a \"type\" tag")]
    MissingType { path: String },
    #[error("{path}: unrecognised type tag {tag:?}")]
    UnknownType { path: String, tag: String },
    #[error("{path}: \"{key}\" is required for type {kind}")]
    MissingKey {
        path: String,
        key: &'static str,
        kind: &'static str,
    },
    #[error("{path}: \"{key}\" must be {expected}")]
    InvalidKey {
        path: String,
        key: &'static str,
        expected: &'static str,
    },
}

impl TypeDescriptor {
    /// Parse a descriptor tree from a decoded JSON (or YAML) value.
    pub fn from_value(value: &Value) -> Result<Self, SchemaCompilationError> {
        parse_node(value, "$")
    }

    /// The descriptor's `type` tag.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object { .. })
    }

    /// Visit this node and every descendant, depth first, with its path.
    pub fn walk(&self, f: &mut dyn FnMut(&str, &TypeDescriptor)) {
        walk_at(self, "$", f);
    }
}

impl TypeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Array { .. } => "array",
            Self::Object { .. } => "object",
        }
    }
}

fn walk_at(node: &TypeDescriptor, path: &str, f: &mut dyn FnMut(&str, &TypeDescriptor)) {
    f(path, node);
    match &node.kind {
        TypeKind::Array { items } => walk_at(items, &format!("{path}.items"), f),
        TypeKind::Object { properties } => {
            for (name, prop) in properties {
                walk_at(prop, &format!("{path}.properties.{name}"), f);
            }
        }
        _ => {}
    }
}

fn parse_node(value: &Value, path: &str) -> Result<TypeDescriptor, SchemaCompilationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaCompilationError::NotAnObject {
            path: path.to_string(),
        })?;

    let tag = match obj.get("type") {
        Some(Value::String(s)) => s.as_str(),
        Some(_) => {
            return Err(SchemaCompilationError::InvalidKey {
                path: path.to_string(),
                key: "type",
                expected: "a string",
            })
        }
        None => {
            return Err(SchemaCompilationError::MissingType {
                path: path.to_string(),
            })
        }
    };

    let nullable = match obj.get("nullable") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(SchemaCompilationError::InvalidKey {
                path: path.to_string(),
                key: "nullable",
                expected: "a boolean",
            })
        }
    };

    let kind = match tag {
        "string" => TypeKind::String,
        "boolean" => TypeKind::Boolean,
        "integer" => TypeKind::Integer {
            format: parse_format(obj, path)?,
        },
        "number" => TypeKind::Number {
            format: parse_format(obj, path)?,
        },
        "array" => {
            let items = obj
                .get("items")
                .ok_or_else(|| SchemaCompilationError::MissingKey {
                    path: path.to_string(),
                    key: "items",
                    kind: "array",
                })?;
            TypeKind::Array {
                items: Box::new(parse_node(items, &format!("{path}.items"))?),
            }
        }
        "object" => {
            let props = match obj.get("properties") {
                Some(Value::Object(props)) => props,
                Some(_) => {
                    return Err(SchemaCompilationError::InvalidKey {
                        path: path.to_string(),
                        key: "properties",
                        expected: "a mapping",
                    })
                }
                None => {
                    return Err(SchemaCompilationError::MissingKey {
                        path: path.to_string(),
                        key: "properties",
                        kind: "object",
                    })
                }
            };
            let mut properties = Vec::with_capacity(props.len());
            for (name, prop) in props {
                let child = parse_node(prop, &format!("{path}.properties.{name}"))?;
                properties.push((name.clone(), child));
            }
            TypeKind::Object { properties }
        }
        other => {
            return Err(SchemaCompilationError::UnknownType {
                path: path.to_string(),
                tag: other.to_string(),
            })
        }
    };

    Ok(TypeDescriptor { kind, nullable })
}

fn parse_format(
    obj: &Map<String, Value>,
    path: &str,
) -> Result<Option<String>, SchemaCompilationError> {
    match obj.get("format") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaCompilationError::InvalidKey {
            path: path.to_string(),
            key: "format",
            expected: "a string",
        }),
    }
}
