use crate::*;
use catwalk_core::ModelMeta;

#[tokio::test]
async fn status_is_empty_200() {
    let server = TestServer::serving("neuron").await;
    let resp = server.get("/status").await.unwrap();
    assert_eq!(resp.status, 200);
    assert!(resp.text.is_empty(), "unexpected body: {}", resp.text);
}

#[tokio::test]
async fn status_is_up_without_a_model() {
    let server = TestServer::start(None, DispatchOptions::default()).await.unwrap();
    assert_eq!(server.get("/status").await.unwrap().status, 200);
}

#[tokio::test]
async fn info_returns_valid_metadata() {
    let server = TestServer::serving("neuron").await;
    let resp = server.get("/info").await.unwrap();
    assert_eq!(resp.status, 200);

    let meta = ModelMeta::from_value(resp.body.clone()).unwrap();
    meta.check().unwrap();
    assert_eq!(meta.name, "neuron");
    assert_eq!(meta.version, "1.0.0");
    assert_eq!(resp.body["schema"]["input"]["type"], "object");
    assert!(resp.body["contact"]["email"].is_string());
}

#[tokio::test]
async fn info_without_a_model() {
    let server = TestServer::start(None, DispatchOptions::default()).await.unwrap();
    let resp = server.get("/info").await.unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(message(&resp.body), "No model loaded.");
}

#[tokio::test]
async fn info_follows_a_remount() {
    let server = TestServer::start(None, DispatchOptions::default()).await.unwrap();
    server.slot.replace(load_model("batch"));
    let resp = server.get("/info").await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["name"], "batch");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let server = TestServer::serving("neuron").await;
    assert_eq!(server.get("/nope").await.unwrap().status, 404);
}
