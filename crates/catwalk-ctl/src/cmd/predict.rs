//! `predict` command — post a request envelope from a file or stdin.

use std::io::Read;

use anyhow::{Context, Result};

use super::http::post_raw;

/// `path` of `-` reads stdin. The body is sent as-is.
pub async fn cmd_predict(base: &str, path: &str) -> Result<()> {
    let body = if path == "-" {
        let mut s = String::new();
        std::io::stdin()
            .read_to_string(&mut s)
            .context("failed to read stdin")?;
        s
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
    };

    let resp = post_raw(&format!("{base}/predict"), body).await?;
    println!("{}", serde_json::to_string_pretty(&resp.body)?);
    if resp.status != 200 {
        eprintln!("HTTP {}", resp.status);
        std::process::exit(1);
    }
    Ok(())
}
