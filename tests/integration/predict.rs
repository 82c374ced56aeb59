use crate::*;
use serde_json::json;

fn row() -> Value {
    json!({ "inputs": [0.5], "weights": [1.0] })
}

#[tokio::test]
async fn bare_input_is_filled_in() {
    let server = TestServer::serving("neuron").await;
    let resp = server.predict(&json!({ "input": row() })).await.unwrap();
    assert_eq!(resp.status, 200, "{}", resp.text);

    assert!(!resp.body["correlation_id"].as_str().unwrap().is_empty());
    assert_eq!(resp.body["model"], json!({ "name": "neuron", "version": "1.0.0" }));
    assert_eq!(resp.body["input"], row());
    assert!(close(&resp.body["output"]["activation"], ACTIVATION_1));
}

#[tokio::test]
async fn envelope_fields_are_echoed() {
    let server = TestServer::serving("neuron").await;
    let resp = server
        .predict(&json!({
            "correlation_id": "1A",
            "model": { "name": "neuron", "version": "1.0.0" },
            "extra_data": { "foo": "bar" },
            "input": { "inputs": [0.5, 0.5], "weights": [1.0, 0.5] }
        }))
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["correlation_id"], "1A");
    assert_eq!(resp.body["extra_data"], json!({ "foo": "bar" }));
    assert!(close(&resp.body["output"]["activation"], ACTIVATION_2));
}

#[tokio::test]
async fn correlation_ids_are_unique() {
    let server = TestServer::serving("neuron").await;
    let a = server.predict(&json!({ "input": row() })).await.unwrap();
    let b = server.predict(&json!({ "input": row() })).await.unwrap();
    assert_ne!(a.body["correlation_id"], b.body["correlation_id"]);
}

#[tokio::test]
async fn json_string_body_is_rejected() {
    let server = TestServer::serving("neuron").await;
    let resp = server.predict(&json!("This should fail")).await.unwrap();
    assert_eq!(resp.status, 400);
    assert!(!message(&resp.body).is_empty());
}

#[tokio::test]
async fn unparseable_body_is_rejected() {
    let server = TestServer::serving("neuron").await;
    let resp = server.post_raw("/predict", "{\"input\": ").await.unwrap();
    assert_eq!(resp.status, 400);
    assert_eq!(message(&resp.body), "Invalid POST data: JSON parse error.");
}

#[tokio::test]
async fn schema_violation_names_the_path() {
    let server = TestServer::serving("neuron").await;
    let resp = server
        .predict(&json!({ "correlation_id": "x", "input": { "inputs": [0.5] } }))
        .await
        .unwrap();
    assert_eq!(resp.status, 400);
    let msg = message(&resp.body);
    assert!(msg.starts_with("Invalid POST data: "), "{msg}");
    assert!(msg.contains("weights"), "{msg}");
    assert_eq!(resp.body["correlation_id"], "x");
}

#[tokio::test]
async fn missing_input_is_rejected() {
    let server = TestServer::serving("neuron").await;
    let resp = server.predict(&json!({ "correlation_id": "x" })).await.unwrap();
    assert_eq!(resp.status, 400);
}

#[tokio::test]
async fn wrong_model_is_not_found() {
    let server = TestServer::serving("neuron").await;
    for model in [
        json!({ "name": "other", "version": "1.0.0" }),
        json!({ "name": "neuron", "version": "9.9.9" }),
    ] {
        let resp = server
            .predict(&json!({ "model": model, "input": row() }))
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(message(&resp.body), "Model not found.");
        assert_eq!(resp.body["model"], model);
        assert!(resp.body["correlation_id"].is_string());
    }
}

#[tokio::test]
async fn batch_model_takes_a_list() {
    let server = TestServer::serving("batch").await;
    let resp = server
        .predict(&json!({
            "input": [row(), { "inputs": [0.5, 0.5], "weights": [1.0, 0.5] }]
        }))
        .await
        .unwrap();
    assert_eq!(resp.status, 200, "{}", resp.text);
    let out = resp.body["output"].as_array().unwrap();
    assert_eq!(out.len(), 2);
    assert!(close(&out[0]["activation"], ACTIVATION_1));
    assert!(close(&out[1]["activation"], ACTIVATION_2));

    let resp = server.predict(&json!({ "input": row() })).await.unwrap();
    assert_eq!(resp.status, 400);
}

#[tokio::test]
async fn concurrent_requests_keep_their_ids() {
    let server = std::sync::Arc::new(TestServer::serving("neuron").await);
    let mut tasks = Vec::new();
    for i in 0..16 {
        let server = server.clone();
        tasks.push(tokio::spawn(async move {
            let id = format!("req-{i}");
            let resp = server
                .predict(&json!({ "correlation_id": id, "input": row() }))
                .await
                .unwrap();
            (id, resp)
        }));
    }
    for t in tasks {
        let (id, resp) = t.await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["correlation_id"], id);
    }
}
