//! Model metadata — the `model.yml` every model directory carries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::descriptor::{SchemaCompilationError, TypeDescriptor, TypeKind};
use crate::identity::Identity;
use crate::io::IoType;

pub const META_FILE: &str = "model.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Raw `io_type`; see `ModelMeta::io_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_type: Option<String>,
    /// Registry key of the computation. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    pub schema: IoSchemas,
    /// Keys this crate does not interpret; kept for `/info`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoSchemas {
    pub input: Value,
    pub output: Value,
}

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse model metadata: {0}")]
    ParseFailed(String),
    #[error("{which} schema: {source}")]
    Schema {
        which: &'static str,
        #[source]
        source: SchemaCompilationError,
    },
    #[error("invalid model metadata: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ModelMeta {
    pub fn from_yaml_str(text: &str) -> Result<Self, MetaError> {
        let doc: Value =
            serde_yaml::from_str(text).map_err(|e| MetaError::ParseFailed(e.to_string()))?;
        Self::from_value(doc)
    }

    pub fn from_value(doc: Value) -> Result<Self, MetaError> {
        serde_json::from_value(doc).map_err(|e| MetaError::ParseFailed(e.to_string()))
    }

    /// Read `<dir>/model.yml`.
    pub fn from_dir(dir: &Path) -> Result<Self, MetaError> {
        let path = dir.join(META_FILE);
        let text =
            std::fs::read_to_string(&path).map_err(|e| MetaError::ReadFailed(path.clone(), e))?;
        Self::from_yaml_str(&text)
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone(), self.version.clone())
    }

    /// Declared IO type, falling back to RECORD_LIST when absent or unknown.
    pub fn io_type(&self) -> IoType {
        match self.io_type.as_deref() {
            None => IoType::default(),
            Some(raw) => IoType::parse(raw).unwrap_or_else(|| {
                tracing::warn!(io_type = raw, "unrecognised io_type, using RECORD_LIST");
                IoType::default()
            }),
        }
    }

    pub fn entry(&self) -> &str {
        self.entry.as_deref().unwrap_or(&self.name)
    }

    pub fn input_descriptor(&self) -> Result<TypeDescriptor, MetaError> {
        TypeDescriptor::from_value(&self.schema.input).map_err(|source| MetaError::Schema {
            which: "input",
            source,
        })
    }

    pub fn output_descriptor(&self) -> Result<TypeDescriptor, MetaError> {
        TypeDescriptor::from_value(&self.schema.output).map_err(|source| MetaError::Schema {
            which: "output",
            source,
        })
    }

    /// Check the document beyond what deserialisation enforces: non-empty
    /// identity and contact, known `io_type`, IO roots that are an object or
    /// a list of objects, and known `format` hints.
    pub fn check(&self) -> Result<(), MetaError> {
        let input = self.input_descriptor()?;
        let output = self.output_descriptor()?;

        let mut problems = Vec::new();
        if self.name.is_empty() {
            problems.push("name must not be empty".to_string());
        }
        if self.version.is_empty() {
            problems.push("version must not be empty".to_string());
        }
        match &self.contact {
            None => problems.push("contact is required".to_string()),
            Some(c) => {
                if c.name.is_empty() {
                    problems.push("contact.name must not be empty".to_string());
                }
                if c.email.is_empty() {
                    problems.push("contact.email must not be empty".to_string());
                }
            }
        }
        if let Some(raw) = &self.io_type {
            if IoType::parse(raw).is_none() {
                problems.push(format!("unknown io_type {raw:?}"));
            }
        }
        for (which, d) in [("input", &input), ("output", &output)] {
            if !is_io_root(d) {
                problems.push(format!(
                    "schema.{which} must be an object or an array of objects"
                ));
            }
            d.walk(&mut |path, node| {
                if let Some(msg) = format_problem(node) {
                    problems.push(format!("schema.{which} {path}: {msg}"));
                }
            });
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(MetaError::Invalid(problems))
        }
    }

    /// The `/info` document.
    pub fn to_info_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn is_io_root(d: &TypeDescriptor) -> bool {
    match &d.kind {
        TypeKind::Object { .. } => true,
        TypeKind::Array { items } => items.is_object(),
        _ => false,
    }
}

fn format_problem(d: &TypeDescriptor) -> Option<String> {
    let (format, allowed): (&Option<String>, &[&str]) = match &d.kind {
        TypeKind::Integer { format } => (format, &["int32", "int64"]),
        TypeKind::Number { format } => (format, &["float32", "float64"]),
        _ => return None,
    };
    match format {
        Some(f) if !allowed.contains(&f.as_str()) => {
            Some(format!("format {f:?} is not one of {}", allowed.join(", ")))
        }
        _ => None,
    }
}
