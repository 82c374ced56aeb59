//! /status — liveness check.

use axum::http::StatusCode;

/// 200 with an empty body whenever the process is serving, mounted or not.
pub async fn handle_status() -> StatusCode {
    StatusCode::OK
}
