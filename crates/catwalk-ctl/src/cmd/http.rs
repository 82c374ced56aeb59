//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result};
use serde_json::Value;

/// Status code and body of a reply. The body is `Null` when empty and a
/// JSON string when it is not JSON.
pub struct Response {
    pub status: u16,
    pub body: Value,
}

async fn read(resp: reqwest::Response) -> Result<Response> {
    let status = resp.status().as_u16();
    let text = resp.text().await.context("failed to read response body")?;
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    Ok(Response { status, body })
}

pub async fn get(url: &str) -> Result<Response> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to catwalkd at {url}, is it running?"))?;
    read(resp).await
}

/// POST `body` verbatim as `application/json`.
pub async fn post_raw(url: &str, body: String) -> Result<Response> {
    let resp = reqwest::Client::new()
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .with_context(|| format!("failed to connect to catwalkd at {url}, is it running?"))?;
    read(resp).await
}

pub async fn post_json(url: &str, body: &Value) -> Result<Response> {
    post_raw(url, body.to_string()).await
}
