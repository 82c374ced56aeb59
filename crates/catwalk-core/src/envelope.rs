//! Request/response envelopes.
//!
//! Every payload travels inside a fixed wrapper:
//!
//! ```text
//! { "correlation_id": "…", "model": { "name": "…", "version": "…" },
//!   "extra_data": { … }, "input": <payload>, "output": <payload> }
//! ```
//!
//! On requests `correlation_id` and `model` are optional; the dispatch
//! engine fills them in. On responses both are required, and `output`
//! carries either the computation's result or `{ "message": "…" }`.

use serde_json::{Map, Value};

use crate::descriptor::TypeDescriptor;
use crate::io::IoType;
use crate::validator::{compile, Field, Validator};

pub const CORRELATION_ID: &str = "correlation_id";
pub const MODEL: &str = "model";
pub const EXTRA_DATA: &str = "extra_data";
pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";

/// Compile a model's IO descriptor for use at the HTTP boundary.
///
/// TABULAR computations accept a single row posted as a bare object, so
/// an object-rooted descriptor becomes "a list of such objects, or one".
pub fn io_validator(descriptor: &TypeDescriptor, io_type: IoType) -> Validator {
    let compiled = compile(descriptor);
    if io_type == IoType::Tabular && descriptor.is_object() {
        Validator::OneOf(vec![Validator::Array(Box::new(compiled.clone())), compiled])
    } else {
        compiled
    }
}

/// Like `io_validator`, but always list-shaped: used where a whole batch
/// of rows is checked at once (test data, tabular results).
pub fn batch_validator(descriptor: &TypeDescriptor) -> Validator {
    let compiled = compile(descriptor);
    if descriptor.is_object() {
        Validator::Array(Box::new(compiled))
    } else {
        compiled
    }
}

fn identity_validator() -> Validator {
    Validator::Object(vec![
        Field::required("name", Validator::NonEmptyString),
        Field::required("version", Validator::NonEmptyString),
    ])
}

/// The request shape. `input` must satisfy `input`; everything else is
/// optional.
pub fn build_request_envelope(input: Validator) -> Validator {
    Validator::Object(vec![
        Field::optional(CORRELATION_ID, Validator::NonEmptyString),
        Field::optional(MODEL, identity_validator()),
        Field::optional(EXTRA_DATA, Validator::FreeObject),
        Field::required(INPUT, input),
    ])
}

/// The response shape: request plus a required `output`, with
/// `correlation_id` and `model` now mandatory. `correlation_id` is left
/// out entirely when `include_correlation_id` is false.
pub fn build_response_envelope(
    input: Validator,
    output: Validator,
    include_correlation_id: bool,
) -> Validator {
    let mut fields = Vec::with_capacity(5);
    if include_correlation_id {
        fields.push(Field::required(CORRELATION_ID, Validator::NonEmptyString));
    }
    fields.push(Field::required(MODEL, identity_validator()));
    fields.push(Field::optional(EXTRA_DATA, Validator::FreeObject));
    fields.push(Field::required(INPUT, input));
    fields.push(Field::required(OUTPUT, output));
    Validator::Object(fields)
}

/// The shape of every error reply's `output`.
pub fn error_output(message: &str) -> Value {
    serde_json::json!({ "message": message })
}

/// Copy the envelope fields worth echoing from a rejected body.
pub fn salvage(body: &Value) -> Map<String, Value> {
    body.as_object().map(salvage_fields).unwrap_or_default()
}

/// `salvage` for a body already known to be an object.
pub fn salvage_fields(envelope: &Map<String, Value>) -> Map<String, Value> {
    [CORRELATION_ID, MODEL, EXTRA_DATA]
        .into_iter()
        .filter_map(|key| envelope.get(key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Fill a missing `correlation_id` with a fresh UUID. Returns the id in
/// effect afterwards.
pub fn ensure_correlation_id(envelope: &mut Map<String, Value>) -> String {
    let entry = envelope
        .entry(CORRELATION_ID)
        .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
    match entry {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fill a missing `model` with the loaded identity.
pub fn ensure_model(envelope: &mut Map<String, Value>, loaded: &crate::Identity) {
    envelope
        .entry(MODEL)
        .or_insert_with(|| loaded.to_value());
}
