//! `status` and `info` commands.

use anyhow::{bail, Result};

use super::http::get;

pub async fn cmd_status(base: &str) -> Result<()> {
    let resp = get(&format!("{base}/status")).await?;
    if resp.status != 200 {
        bail!("catwalkd returned {} for /status", resp.status);
    }
    println!("catwalkd at {base} is up");
    Ok(())
}

pub async fn cmd_info(base: &str) -> Result<()> {
    let resp = get(&format!("{base}/info")).await?;
    if resp.status != 200 {
        let message = resp.body["output"]["message"].as_str().unwrap_or("unknown error");
        bail!("/info returned {}: {message}", resp.status);
    }

    let field = |k: &str| resp.body[k].as_str().unwrap_or("-").to_string();
    println!("═══════════════════════════════════════");
    println!("  Mounted Model");
    println!("═══════════════════════════════════════");
    println!("  Name     : {}", field("name"));
    println!("  Version  : {}", field("version"));
    println!("  IO type  : {}", resp.body["io_type"].as_str().unwrap_or("RECORD_LIST"));
    if let Some(contact) = resp.body.get("contact") {
        println!(
            "  Contact  : {} <{}>",
            contact["name"].as_str().unwrap_or("-"),
            contact["email"].as_str().unwrap_or("-")
        );
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&resp.body["schema"])?);
    Ok(())
}
