use std::path::Path;
use std::sync::Arc;

use crate::*;
use catwalk_core::{Frame, ModelMeta};
use catwalk_services::{Computation, TestData};
use serde_json::json;

/// Fails every prediction.
struct Broken;

impl Computation for Broken {
    fn predict(&self, _input: Frame) -> anyhow::Result<Frame> {
        anyhow::bail!("weights file is corrupt")
    }

    fn load_test_data(&self, _dir: &Path) -> anyhow::Result<TestData> {
        anyhow::bail!("no test data")
    }
}

/// Returns a string where the schema says number.
struct Sloppy;

impl Computation for Sloppy {
    fn predict(&self, _input: Frame) -> anyhow::Result<Frame> {
        Ok(Frame::Records(json!({ "activation": "high" })))
    }

    fn load_test_data(&self, _dir: &Path) -> anyhow::Result<TestData> {
        anyhow::bail!("no test data")
    }
}

fn mount_with(computation: Arc<dyn Computation>) -> Mount {
    let meta = ModelMeta::from_dir(&models_dir().join("neuron")).unwrap();
    Mount::new(meta, computation).unwrap()
}

#[tokio::test]
async fn no_model_loaded() {
    let server = TestServer::start(None, DispatchOptions::default()).await.unwrap();
    let resp = server.predict(&json!({ "input": {} })).await.unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(message(&resp.body), "No model loaded.");
}

#[tokio::test]
async fn computation_failure_is_a_json_500() {
    let server = TestServer::start(Some(mount_with(Arc::new(Broken))), DispatchOptions::default())
        .await
        .unwrap();
    let resp = server
        .predict(&json!({
            "correlation_id": "c-42",
            "extra_data": { "foo": "bar" },
            "input": { "inputs": [1.0], "weights": [1.0] }
        }))
        .await
        .unwrap();
    assert_eq!(resp.status, 500);
    assert!(resp.body.is_object(), "body is not JSON: {}", resp.text);
    let msg = message(&resp.body);
    assert!(msg.starts_with("Computation failed: "), "{msg}");
    assert!(msg.contains("weights file is corrupt"), "{msg}");
    assert_eq!(resp.body["correlation_id"], "c-42");
    assert_eq!(resp.body["extra_data"], json!({ "foo": "bar" }));
    assert_eq!(resp.body["model"]["name"], "neuron");
    assert!(resp.body.get("input").is_none());

    // A generated id is echoed too.
    let resp = server
        .predict(&json!({ "input": { "inputs": [1.0], "weights": [1.0] } }))
        .await
        .unwrap();
    assert_eq!(resp.status, 500);
    assert!(!resp.body["correlation_id"].as_str().unwrap_or_default().is_empty());

    // The server keeps serving afterwards.
    assert_eq!(server.get("/status").await.unwrap().status, 200);
}

#[tokio::test]
async fn output_validation_is_opt_in() {
    let lax = TestServer::start(Some(mount_with(Arc::new(Sloppy))), DispatchOptions::default())
        .await
        .unwrap();
    let body = json!({ "input": { "inputs": [1.0], "weights": [1.0] } });
    assert_eq!(lax.predict(&body).await.unwrap().status, 200);

    let strict = TestServer::start(
        Some(mount_with(Arc::new(Sloppy))),
        DispatchOptions { validate_output: true },
    )
    .await
    .unwrap();
    let resp = strict.predict(&body).await.unwrap();
    assert_eq!(resp.status, 500);
    assert!(message(&resp.body).starts_with("Invalid model output: "));
}
