//! HTTP handlers. Each one is a thin shell over the `Dispatcher`.

pub mod info;
pub mod predict;
pub mod status;

use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use catwalk_services::{Dispatcher, Reply};

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Dispatcher,
}

impl ApiState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn into_response(route: &'static str, reply: Reply) -> (StatusCode, Json<Value>) {
    let code = StatusCode::from_u16(reply.status.http_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !code.is_success() {
        tracing::warn!(
            route,
            status = code.as_u16(),
            stage = ?reply.stage,
            message = reply.message().unwrap_or_default(),
            "request rejected"
        );
    }
    (code, Json(reply.body))
}

pub use info::handle_info;
pub use predict::handle_predict;
pub use status::handle_status;
