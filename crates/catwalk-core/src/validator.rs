//! Compiled validators: structural predicates over decoded JSON values.
//!
//! A `Validator` is compiled once per descriptor and reused for every
//! request. Validation is pure: the same value always yields the same
//! result. Objects are permissive: keys a validator does not declare are
//! accepted untouched.

use serde_json::Value;
use thiserror::Error;

use crate::descriptor::{SchemaCompilationError, TypeDescriptor, TypeKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// Accepts any value.
    Any,
    String,
    /// A string with at least one character.
    NonEmptyString,
    Boolean,
    /// Integral numbers only. `1.0` is a float and is rejected.
    Integer,
    /// Any JSON number.
    Number,
    /// Any mapping, contents unchecked.
    FreeObject,
    Array(Box<Validator>),
    Object(Vec<Field>),
    Nullable(Box<Validator>),
    /// Accepts a value matching at least one alternative, tried in order.
    OneOf(Vec<Validator>),
}

/// One declared key of an object validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub validator: Validator,
    pub required: bool,
}

impl Field {
    pub fn required(name: &str, validator: Validator) -> Self {
        Self {
            name: name.to_string(),
            validator,
            required: true,
        }
    }

    pub fn optional(name: &str, validator: Validator) -> Self {
        Self {
            name: name.to_string(),
            validator,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{path}: missing key '{key}'")]
    MissingKey { path: String, key: String },
    #[error("{path}: must not be empty")]
    EmptyString { path: String },
    #[error("{path}: matched none of the accepted shapes ({})", .reasons.join("; "))]
    NoAlternative { path: String, reasons: Vec<String> },
}

impl ValidationError {
    pub fn path(&self) -> &str {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::MissingKey { path, .. }
            | Self::EmptyString { path }
            | Self::NoAlternative { path, .. } => path,
        }
    }
}

/// Compile a parsed descriptor into a validator.
///
/// Declared object properties are required unless they are nullable, in
/// which case an absent key is treated the same as `null`.
pub fn compile(descriptor: &TypeDescriptor) -> Validator {
    let base = match &descriptor.kind {
        TypeKind::String => Validator::String,
        TypeKind::Boolean => Validator::Boolean,
        TypeKind::Integer { .. } => Validator::Integer,
        TypeKind::Number { .. } => Validator::Number,
        TypeKind::Array { items } => Validator::Array(Box::new(compile(items))),
        TypeKind::Object { properties } => Validator::Object(
            properties
                .iter()
                .map(|(name, prop)| Field {
                    name: name.clone(),
                    validator: compile(prop),
                    required: !prop.nullable,
                })
                .collect(),
        ),
    };
    if descriptor.nullable {
        Validator::Nullable(Box::new(base))
    } else {
        base
    }
}

/// Parse and compile a raw descriptor value in one step.
pub fn compile_value(value: &Value) -> Result<Validator, SchemaCompilationError> {
    TypeDescriptor::from_value(value).map(|d| compile(&d))
}

impl Validator {
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.check(value, "$")
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.validate(value).is_ok()
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        match self {
            Self::Any => Ok(()),
            Self::String => expect(value.is_string(), "string", value, path),
            Self::NonEmptyString => match value {
                Value::String(s) if s.is_empty() => Err(ValidationError::EmptyString {
                    path: path.to_string(),
                }),
                Value::String(_) => Ok(()),
                other => expect(false, "string", other, path),
            },
            Self::Boolean => expect(value.is_boolean(), "boolean", value, path),
            Self::Integer => expect(is_integral(value), "integer", value, path),
            Self::Number => expect(value.is_number(), "number", value, path),
            Self::FreeObject => expect(value.is_object(), "object", value, path),
            Self::Array(items) => {
                let arr = value.as_array().ok_or_else(|| mismatch("array", value, path))?;
                for (i, item) in arr.iter().enumerate() {
                    items.check(item, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            Self::Object(fields) => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| mismatch("object", value, path))?;
                for field in fields {
                    match obj.get(&field.name) {
                        Some(v) => field.validator.check(v, &format!("{path}.{}", field.name))?,
                        None if field.required => {
                            return Err(ValidationError::MissingKey {
                                path: path.to_string(),
                                key: field.name.clone(),
                            })
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            Self::Nullable(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.check(value, path)
                }
            }
            Self::OneOf(alternatives) => {
                let mut reasons = Vec::with_capacity(alternatives.len());
                for alt in alternatives {
                    match alt.check(value, path) {
                        Ok(()) => return Ok(()),
                        Err(e) => reasons.push(e.to_string()),
                    }
                }
                Err(ValidationError::NoAlternative {
                    path: path.to_string(),
                    reasons,
                })
            }
        }
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

fn expect(ok: bool, expected: &'static str, value: &Value, path: &str) -> Result<(), ValidationError> {
    if ok {
        Ok(())
    } else {
        Err(mismatch(expected, value, path))
    }
}

fn mismatch(expected: &'static str, value: &Value, path: &str) -> ValidationError {
    ValidationError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: kind_of(value),
    }
}

/// JSON kind name used in error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(descriptor: Value) -> Validator {
        compile_value(&descriptor).expect("descriptor should compile")
    }

    #[test]
    fn primitives_accept_only_their_kind() {
        let s = v(json!({ "type": "string" }));
        assert!(s.accepts(&json!("hi")));
        assert!(!s.accepts(&json!(1)));
        assert!(!s.accepts(&Value::Null));

        let b = v(json!({ "type": "boolean" }));
        assert!(b.accepts(&json!(true)));
        assert!(!b.accepts(&json!("true")));

        let i = v(json!({ "type": "integer", "format": "int64" }));
        assert!(i.accepts(&json!(3)));
        assert!(i.accepts(&json!(-3)));
        assert!(!i.accepts(&json!(3.5)));
        assert!(!i.accepts(&json!(1.0)));
        assert!(!i.accepts(&json!(true)));

        let n = v(json!({ "type": "number" }));
        assert!(n.accepts(&json!(3)));
        assert!(n.accepts(&json!(0.25)));
        assert!(!n.accepts(&json!("0.25")));
    }

    #[test]
    fn arrays_check_every_element() {
        let a = v(json!({ "type": "array", "items": { "type": "number" } }));
        assert!(a.accepts(&json!([])));
        assert!(a.accepts(&json!([1, 2.5])));
        let err = a.validate(&json!([1, "x"])).unwrap_err();
        assert_eq!(err.path(), "$[1]");
        assert!(!a.accepts(&json!(1)));
        assert!(!a.accepts(&json!([[1]])));
    }

    #[test]
    fn objects_are_permissive_about_extra_keys() {
        let o = v(json!({
            "type": "object",
            "properties": { "x": { "type": "number" } }
        }));
        assert!(o.accepts(&json!({ "x": 1, "anything": "else" })));
        assert!(!o.accepts(&json!({ "x": "1" })));
        assert!(!o.accepts(&json!([{ "x": 1 }])));
    }

    #[test]
    fn declared_keys_are_required_unless_nullable() {
        let o = v(json!({
            "type": "object",
            "properties": {
                "x": { "type": "number" },
                "note": { "type": "string", "nullable": true }
            }
        }));
        assert!(o.accepts(&json!({ "x": 1 })));
        assert!(o.accepts(&json!({ "x": 1, "note": null })));
        let err = o.validate(&json!({ "note": "n" })).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingKey {
                path: "$".into(),
                key: "x".into()
            }
        );
    }

    #[test]
    fn nullable_widens_every_kind() {
        for ty in ["string", "boolean", "integer", "number"] {
            let plain = v(json!({ "type": ty }));
            let nullable = v(json!({ "type": ty, "nullable": true }));
            assert!(!plain.accepts(&Value::Null), "{ty} should reject null");
            assert!(nullable.accepts(&Value::Null), "{ty} nullable should accept null");
        }
        let arr = v(json!({ "type": "array", "items": { "type": "string" }, "nullable": true }));
        assert!(arr.accepts(&Value::Null));
        assert!(arr.accepts(&json!(["a"])));
        let obj = v(json!({ "type": "object", "properties": {}, "nullable": true }));
        assert!(obj.accepts(&Value::Null));
    }

    #[test]
    fn nested_error_paths() {
        let o = v(json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "inputs": { "type": "array", "items": { "type": "number" } }
                }
            }
        }));
        let err = o
            .validate(&json!([{ "inputs": [1] }, { "inputs": [1, "two"] }]))
            .unwrap_err();
        assert_eq!(err.path(), "$[1].inputs[1]");
        assert_eq!(
            err.to_string(),
            "$[1].inputs[1]: expected number, found string"
        );
    }

    #[test]
    fn one_of_reports_every_reason() {
        let item = Validator::Object(vec![Field::required("x", Validator::Number)]);
        let either = Validator::OneOf(vec![Validator::Array(Box::new(item.clone())), item]);
        assert!(either.accepts(&json!({ "x": 1 })));
        assert!(either.accepts(&json!([{ "x": 1 }])));
        let err = either.validate(&json!("nope")).unwrap_err();
        match err {
            ValidationError::NoAlternative { reasons, .. } => assert_eq!(reasons.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_empty_string() {
        assert!(Validator::NonEmptyString.accepts(&json!("a")));
        assert!(!Validator::NonEmptyString.accepts(&json!("")));
        assert!(!Validator::NonEmptyString.accepts(&json!(1)));
    }

    #[test]
    fn validation_is_deterministic() {
        let o = v(json!({ "type": "object", "properties": { "x": { "type": "integer" } } }));
        let bad = json!({ "x": 1.5 });
        assert_eq!(o.validate(&bad), o.validate(&bad));
    }
}
