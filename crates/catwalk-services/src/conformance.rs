//! Model conformance checks, run before a model is served.
//!
//! A model ships its own example inputs and the outputs it should
//! produce. The check validates both against the model's descriptors,
//! runs the computation over the inputs, and compares what came back.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use catwalk_core::envelope::batch_validator;
use catwalk_core::validator::compile;
use catwalk_core::{Frame, IoType, MetaError, ValidationError, Validator};

use crate::mount::Mount;

/// Relative tolerance for comparing numbers in expected vs actual output.
const REL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("failed to load test data: {0:#}")]
    TestData(anyhow::Error),
    #[error(transparent)]
    Meta(#[from] MetaError),
    #[error("test {which} do not match the model schema: {source}")]
    Schema {
        which: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("test inputs and outputs differ in length ({inputs} vs {outputs})")]
    LengthMismatch { inputs: usize, outputs: usize },
    #[error("predict failed on case {case}: {cause:#}")]
    Predict { case: usize, cause: anyhow::Error },
    #[error("case {case}: output does not match the model schema: {source}")]
    OutputSchema {
        case: usize,
        #[source]
        source: ValidationError,
    },
    #[error("case {case}: expected {expected}, got {actual}")]
    Mismatch {
        case: usize,
        expected: Value,
        actual: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceReport {
    /// Number of predict invocations made.
    pub cases: usize,
    /// Number of input rows covered.
    pub rows: usize,
}

/// Run `mount`'s computation over its own test data.
pub fn check(mount: &Mount, model_dir: &Path) -> Result<ConformanceReport, ConformanceError> {
    let data = mount
        .computation()
        .load_test_data(model_dir)
        .map_err(ConformanceError::TestData)?;

    let input_desc = mount.meta().input_descriptor()?;
    let output_desc = mount.meta().output_descriptor()?;
    let inputs_v = batch_validator(&input_desc);
    let outputs_v = batch_validator(&output_desc);

    let inputs_json = data.inputs.to_json();
    let outputs_json = data.outputs.to_json();
    inputs_v
        .validate(&inputs_json)
        .map_err(|source| ConformanceError::Schema { which: "inputs", source })?;
    outputs_v
        .validate(&outputs_json)
        .map_err(|source| ConformanceError::Schema { which: "outputs", source })?;

    let row_by_row = mount.io_type() == IoType::RecordList && input_desc.is_object();
    let report = if row_by_row {
        let inputs = into_rows(inputs_json);
        let expected = into_rows(outputs_json);
        if inputs.len() != expected.len() {
            return Err(ConformanceError::LengthMismatch {
                inputs: inputs.len(),
                outputs: expected.len(),
            });
        }
        let cases = inputs.len();
        let row_v = compile(&output_desc);
        for (case, (input, want)) in inputs.into_iter().zip(expected).enumerate() {
            let got = run_case(mount, case, Frame::Records(input), &row_v)?;
            compare(case, &want, &got)?;
        }
        ConformanceReport { cases, rows: cases }
    } else {
        let rows = expected_len(&data.inputs);
        let got = run_case(mount, 0, data.inputs, &outputs_v)?;
        compare(0, &outputs_json, &got)?;
        ConformanceReport { cases: 1, rows }
    };

    tracing::info!(
        model = %mount.identity(),
        cases = report.cases,
        rows = report.rows,
        "conformance checks passed"
    );
    Ok(report)
}

fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        other => vec![other],
    }
}

fn expected_len(frame: &Frame) -> usize {
    match frame {
        Frame::Records(Value::Array(rows)) => rows.len(),
        Frame::Records(_) => 1,
        Frame::Table(t) => t.num_rows(),
    }
}

fn run_case(
    mount: &Mount,
    case: usize,
    input: Frame,
    validator: &Validator,
) -> Result<Value, ConformanceError> {
    let out = mount
        .computation()
        .predict(input)
        .map_err(|cause| ConformanceError::Predict { case, cause })?;
    let expected_kind = match mount.io_type() {
        IoType::RecordList => "records",
        IoType::Tabular => "table",
    };
    if out.kind() != expected_kind {
        return Err(ConformanceError::Predict {
            case,
            cause: anyhow::anyhow!("{} computation returned a {} frame", mount.io_type(), out.kind()),
        });
    }
    let json = out.to_json();
    validator
        .validate(&json)
        .map_err(|source| ConformanceError::OutputSchema { case, source })?;
    Ok(json)
}

fn compare(case: usize, expected: &Value, actual: &Value) -> Result<(), ConformanceError> {
    if approx_eq(expected, actual) {
        Ok(())
    } else {
        Err(ConformanceError::Mismatch {
            case,
            expected: expected.clone(),
            actual: actual.clone(),
        })
    }
}

/// Structural equality with a relative tolerance on numbers.
fn approx_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => {
                let scale = x.abs().max(y.abs()).max(f64::MIN_POSITIVE);
                x == y || (x - y).abs() / scale <= REL_TOLERANCE
            }
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| approx_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| approx_eq(x, y)))
        }
        _ => a == b,
    }
}
