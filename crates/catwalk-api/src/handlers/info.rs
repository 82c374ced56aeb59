//! /info — metadata of the mounted model.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::{into_response, ApiState};

pub async fn handle_info(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    into_response("/info", state.dispatcher.info())
}
