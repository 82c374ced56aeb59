//! Catwalk integration test harness.
//!
//! Each test serves a real router on an ephemeral localhost port and
//! talks to it over HTTP:
//!
//!   cargo test --test integration
//!
//! Models come from the repository's `models/` directory.

mod failures;
mod info;
mod predict;
mod tabular;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::net::TcpListener;

use catwalk_api::ApiState;
use catwalk_services::{ComputationRegistry, DispatchOptions, Dispatcher, Mount, MountSlot};

// ── Harness ───────────────────────────────────────────────────────────────────

pub fn models_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

pub fn load_model(name: &str) -> Mount {
    catwalk_services::load(&models_dir().join(name), &ComputationRegistry::with_builtins())
        .unwrap_or_else(|e| panic!("bundled model {name} failed to load: {e}"))
}

/// A server running on 127.0.0.1 for the lifetime of the test's runtime.
pub struct TestServer {
    pub base: String,
    pub slot: MountSlot,
    client: reqwest::Client,
}

pub struct Response {
    pub status: u16,
    pub text: String,
    pub body: Value,
}

impl TestServer {
    pub async fn start(mount: Option<Mount>, options: DispatchOptions) -> Result<Self> {
        let slot = match mount {
            Some(m) => MountSlot::with_mount(m),
            None => MountSlot::new(),
        };
        let state = ApiState::new(Dispatcher::new(slot.clone(), options));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = catwalk_api::serve_on(listener, state, std::future::pending()).await;
        });

        Ok(Self {
            base,
            slot,
            client: reqwest::Client::new(),
        })
    }

    pub async fn serving(model: &str) -> Self {
        Self::start(Some(load_model(model)), DispatchOptions::default())
            .await
            .expect("server should start")
    }

    async fn read(resp: reqwest::Response) -> Result<Response> {
        let status = resp.status().as_u16();
        let text = resp.text().await.context("failed to read body")?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(Response { status, text, body })
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let resp = self.client.get(format!("{}{path}", self.base)).send().await?;
        Self::read(resp).await
    }

    pub async fn post_raw(&self, path: &str, body: impl Into<String>) -> Result<Response> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .header("content-type", "application/json")
            .body(body.into())
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn predict(&self, body: &Value) -> Result<Response> {
        self.post_raw("/predict", body.to_string()).await
    }
}

pub fn message(body: &Value) -> &str {
    body["output"]["message"].as_str().unwrap_or_default()
}

pub fn close(a: &Value, b: f64) -> bool {
    a.as_f64().is_some_and(|a| (a - b).abs() < 1e-9)
}

pub const ACTIVATION_1: f64 = 0.6224593312018546;
pub const ACTIVATION_2: f64 = 0.679178699175393;
