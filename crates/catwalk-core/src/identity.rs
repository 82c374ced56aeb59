//! Model identity, the `{name, version}` pair a request addresses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub version: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The wire form placed in an envelope's `model` field.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "name": self.name, "version": self.version })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// True iff the requested identity names exactly the loaded one.
///
/// Comparison is case-sensitive with no normalisation. A missing or
/// non-string `name`/`version` on the request side is a non-match.
pub fn matches(requested: &Value, loaded: &Identity) -> bool {
    let name = requested.get("name").and_then(Value::as_str);
    let version = requested.get("version").and_then(Value::as_str);
    name == Some(loaded.name.as_str()) && version == Some(loaded.version.as_str())
}
