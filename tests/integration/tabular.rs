use crate::*;
use serde_json::json;

#[tokio::test]
async fn single_row_round_trips_as_object() {
    let server = TestServer::serving("dataframe").await;
    let resp = server
        .predict(&json!({ "input": { "inputs": [0.5], "weights": [1.0] } }))
        .await
        .unwrap();
    assert_eq!(resp.status, 200, "{}", resp.text);
    assert!(resp.body["output"].is_object());
    assert!(close(&resp.body["output"]["activation"], ACTIVATION_1));
}

#[tokio::test]
async fn row_list_round_trips_as_list() {
    let server = TestServer::serving("dataframe").await;
    let resp = server
        .predict(&json!({
            "input": [
                { "inputs": [0.5], "weights": [1.0] },
                { "inputs": [0.5, 0.5], "weights": [1.0, 0.5] }
            ]
        }))
        .await
        .unwrap();
    assert_eq!(resp.status, 200, "{}", resp.text);
    let out = resp.body["output"].as_array().unwrap();
    assert_eq!(out.len(), 2);
    assert!(close(&out[1]["activation"], ACTIVATION_2));
}

#[tokio::test]
async fn empty_row_list_gives_empty_output() {
    let server = TestServer::serving("dataframe").await;
    let resp = server.predict(&json!({ "input": [] })).await.unwrap();
    assert_eq!(resp.status, 200, "{}", resp.text);
    assert_eq!(resp.body["output"], json!([]));
    assert_eq!(resp.body["input"], json!([]));
}

#[tokio::test]
async fn scalar_input_is_rejected() {
    let server = TestServer::serving("dataframe").await;
    let resp = server.predict(&json!({ "input": 3 })).await.unwrap();
    assert_eq!(resp.status, 400);
}
