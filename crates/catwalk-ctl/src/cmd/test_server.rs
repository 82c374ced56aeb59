//! `test-server` command — conformance checks against a running server.
//!
//! The model directory is loaded locally to get its test inputs and the
//! response envelope; the server is expected to be serving the same model.

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde_json::{json, Value};

use catwalk_core::envelope::{CORRELATION_ID, EXTRA_DATA, INPUT, MODEL, OUTPUT};
use catwalk_core::{IoType, ModelMeta};
use catwalk_services::{ComputationRegistry, Mount};

use super::http::{get, post_json, post_raw};

pub async fn cmd_test_server(base: &str, model_dir: &Path) -> Result<()> {
    let mount = catwalk_services::load(model_dir, &ComputationRegistry::with_builtins())
        .with_context(|| format!("failed to load {}", model_dir.display()))?;
    let inputs = test_inputs(&mount, model_dir)?;
    ensure!(!inputs.is_empty(), "model has no test inputs");

    // ── /status ──────────────────────────────────────────────────────────────

    let resp = get(&format!("{base}/status")).await?;
    ensure!(resp.status == 200, "/status returned {}", resp.status);
    ensure!(resp.body.is_null(), "/status body should be empty, got {}", resp.body);
    println!("  ok  /status");

    // ── /info ────────────────────────────────────────────────────────────────

    let resp = get(&format!("{base}/info")).await?;
    ensure!(resp.status == 200, "/info returned {}: {}", resp.status, resp.body);
    let served = ModelMeta::from_value(resp.body).context("/info is not model metadata")?;
    served.check().context("/info metadata is invalid")?;
    ensure!(
        &served.identity() == mount.identity(),
        "server is serving {}, expected {}",
        served.identity(),
        mount.identity()
    );
    println!("  ok  /info ({})", served.identity());

    // ── /predict ─────────────────────────────────────────────────────────────

    let url = format!("{base}/predict");
    let model = mount.identity().to_value();
    let mut posted = 0;
    for input in &inputs {
        let variants = [
            json!({ INPUT: input }),
            json!({ INPUT: input, CORRELATION_ID: "1A" }),
            json!({ INPUT: input, MODEL: model }),
            json!({ INPUT: input, EXTRA_DATA: { "foo": "bar" } }),
        ];
        for request in &variants {
            let resp = post_json(&url, request).await?;
            ensure!(
                resp.status == 200,
                "/predict returned {} for {request}: {}",
                resp.status,
                resp.body
            );
            mount
                .response_validator()
                .validate(&resp.body)
                .with_context(|| format!("reply does not match the response envelope: {}", resp.body))?;
            check_echo(request, &resp.body)?;
            posted += 1;
        }
    }
    println!("  ok  /predict ({posted} requests)");

    let resp = post_raw(&url, json!("This should fail").to_string()).await?;
    ensure!(resp.status == 400, "invalid body returned {}", resp.status);
    error_message(&resp.body)?;
    println!("  ok  /predict rejects an invalid body");

    let wrong = json!({
        INPUT: inputs[0],
        MODEL: { "name": format!("not-{}", mount.identity().name), "version": mount.identity().version },
    });
    let resp = post_json(&url, &wrong).await?;
    ensure!(resp.status == 404, "wrong model returned {}", resp.status);
    error_message(&resp.body)?;
    println!("  ok  /predict rejects another model's identity");

    println!("\nAll server checks passed.");
    Ok(())
}

/// Request inputs derived from the model's test data: one per row for
/// object-rooted RECORD_LIST models, the whole batch otherwise. TABULAR
/// models additionally get a bare single row.
fn test_inputs(mount: &Mount, model_dir: &Path) -> Result<Vec<Value>> {
    let data = mount
        .computation()
        .load_test_data(model_dir)
        .context("failed to load test data")?;
    let all = data.inputs.to_json();
    let object_rooted = mount.meta().input_descriptor()?.is_object();

    let inputs = match (mount.io_type(), all) {
        (IoType::RecordList, Value::Array(rows)) if object_rooted => rows,
        (IoType::Tabular, Value::Array(rows)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(first) = rows.first() {
                out.push(first.clone());
            }
            out.push(Value::Array(rows));
            out
        }
        (_, other) => vec![other],
    };
    Ok(inputs)
}

fn check_echo(request: &Value, reply: &Value) -> Result<()> {
    for key in [CORRELATION_ID, MODEL, EXTRA_DATA] {
        if let Some(sent) = request.get(key) {
            ensure!(
                reply.get(key) == Some(sent),
                "{key} was not echoed: sent {sent}, got {}",
                reply.get(key).unwrap_or(&Value::Null)
            );
        }
    }
    ensure!(
        reply.get(CORRELATION_ID).and_then(Value::as_str).is_some_and(|s| !s.is_empty()),
        "reply has no correlation_id"
    );
    Ok(())
}

fn error_message(body: &Value) -> Result<&str> {
    match body.get(OUTPUT).and_then(|o| o.get("message")).and_then(Value::as_str) {
        Some(m) if !m.is_empty() => Ok(m),
        _ => bail!("error reply has no output.message: {body}"),
    }
}
