//! /predict — run one request envelope through the mounted computation.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};

use catwalk_core::envelope::{error_output, OUTPUT};

use super::{into_response, ApiState};

/// The body is taken as raw bytes so malformed JSON reaches the dispatcher
/// and gets its own 400 reply instead of axum's rejection.
pub async fn handle_predict(
    State(state): State<ApiState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    tracing::info!(bytes = body.len(), "predict request received");

    let dispatcher = state.dispatcher.clone();
    let outcome = tokio::task::spawn_blocking(move || dispatcher.predict(&body)).await;

    match outcome {
        Ok(Ok(reply)) => into_response("/predict", reply),
        Ok(Err(failed)) => {
            tracing::error!(
                correlation_id = %failed.correlation_id,
                error = %format!("{:#}", failed.cause),
                "computation failed"
            );
            computation_failed(failed.echo, &format!("{:#}", failed.cause))
        }
        Err(join) => {
            tracing::error!(error = %join, "predict task aborted");
            computation_failed(Map::new(), &join.to_string())
        }
    }
}

/// 500 with the echoed envelope fields and `output.message`.
fn computation_failed(echo: Map<String, Value>, cause: &str) -> (StatusCode, Json<Value>) {
    let mut body = echo;
    body.insert(
        OUTPUT.to_string(),
        error_output(&format!("Computation failed: {cause}")),
    );
    (StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Object(body)))
}
