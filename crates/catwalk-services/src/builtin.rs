//! Bundled example computations.
//!
//! All three implement a single artificial neuron: the dot product of
//! `inputs` and `weights` fed through a sigmoid, returned as `activation`.
//! They differ only in how the data arrives:
//!
//! - `neuron`: RECORD_LIST, one record per request
//! - `batch`: RECORD_LIST, a list of records per request
//! - `dataframe`: TABULAR, a table of rows per request

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

use catwalk_core::{Frame, Table};

use crate::computation::{Computation, ComputationRegistry, TestData};

pub fn register_all(registry: &mut ComputationRegistry) {
    registry.register("neuron", neuron);
    registry.register("batch", batch);
    registry.register("dataframe", dataframe);
}

fn neuron(_model_dir: &Path) -> Result<Arc<dyn Computation>> {
    Ok(Arc::new(Neuron))
}

fn batch(_model_dir: &Path) -> Result<Arc<dyn Computation>> {
    Ok(Arc::new(Batch))
}

fn dataframe(_model_dir: &Path) -> Result<Arc<dyn Computation>> {
    Ok(Arc::new(DataFrameNeuron))
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn numbers(value: &Value, field: &str) -> Result<Vec<f64>> {
    value
        .as_array()
        .with_context(|| format!("{field} must be a list"))?
        .iter()
        .map(|v| v.as_f64().with_context(|| format!("{field} must hold numbers")))
        .collect()
}

fn activate(inputs: &Value, weights: &Value) -> Result<f64> {
    let inputs = numbers(inputs, "inputs")?;
    let weights = numbers(weights, "weights")?;
    if inputs.len() != weights.len() {
        bail!(
            "inputs and weights differ in length ({} vs {})",
            inputs.len(),
            weights.len()
        );
    }
    let x: f64 = inputs.iter().zip(&weights).map(|(i, w)| i * w).sum();
    Ok(sigmoid(x))
}

fn activate_record(record: &Map<String, Value>) -> Result<Value> {
    let inputs = record.get("inputs").context("missing inputs")?;
    let weights = record.get("weights").context("missing weights")?;
    Ok(json!({ "activation": activate(inputs, weights)? }))
}

fn sample_records() -> Vec<Value> {
    vec![
        json!({ "inputs": [0.5], "weights": [1.0] }),
        json!({ "inputs": [0.5, 0.5], "weights": [1.0, 0.5] }),
    ]
}

fn sample_activations() -> Vec<Value> {
    vec![
        json!({ "activation": 0.6224593312018546 }),
        json!({ "activation": 0.679178699175393 }),
    ]
}

// ── neuron ────────────────────────────────────────────────────────────────────

pub struct Neuron;

impl Computation for Neuron {
    fn predict(&self, input: Frame) -> Result<Frame> {
        let Frame::Records(Value::Object(record)) = input else {
            bail!("neuron expects a single record");
        };
        Ok(Frame::Records(activate_record(&record)?))
    }

    fn load_test_data(&self, _model_dir: &Path) -> Result<TestData> {
        Ok(TestData {
            inputs: Frame::Records(Value::Array(sample_records())),
            outputs: Frame::Records(Value::Array(sample_activations())),
        })
    }
}

// ── batch ─────────────────────────────────────────────────────────────────────

pub struct Batch;

impl Computation for Batch {
    fn predict(&self, input: Frame) -> Result<Frame> {
        let Frame::Records(Value::Array(records)) = input else {
            bail!("batch expects a list of records");
        };
        let out = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let obj = r
                    .as_object()
                    .with_context(|| format!("record {i} is not an object"))?;
                activate_record(obj).with_context(|| format!("record {i}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Frame::Records(Value::Array(out)))
    }

    fn load_test_data(&self, _model_dir: &Path) -> Result<TestData> {
        Ok(TestData {
            inputs: Frame::Records(Value::Array(sample_records())),
            outputs: Frame::Records(Value::Array(sample_activations())),
        })
    }
}

// ── dataframe ─────────────────────────────────────────────────────────────────

pub struct DataFrameNeuron;

impl Computation for DataFrameNeuron {
    fn predict(&self, input: Frame) -> Result<Frame> {
        let Frame::Table(table) = input else {
            bail!("dataframe expects a table");
        };
        if table.num_rows() == 0 {
            return Ok(Frame::Table(Table::from_columns([("activation", Vec::new())])?));
        }
        let inputs = table.column("inputs").context("missing column inputs")?;
        let weights = table.column("weights").context("missing column weights")?;
        let activations = inputs
            .iter()
            .zip(weights)
            .enumerate()
            .map(|(row, (i, w))| {
                activate(i, w)
                    .map(|y| json!(y))
                    .with_context(|| format!("row {row}"))
            })
            .collect::<Result<Vec<_>>>()?;
        let out = Table::from_columns([("activation", activations)])?;
        Ok(Frame::Table(out))
    }

    fn load_test_data(&self, _model_dir: &Path) -> Result<TestData> {
        Ok(TestData {
            inputs: Frame::Table(Table::from_records(&sample_records())?),
            outputs: Frame::Table(Table::from_records(&sample_activations())?),
        })
    }
}
