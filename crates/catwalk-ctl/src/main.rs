//! catwalk-ctl — command-line client for catwalkd.

mod cmd;

use std::path::Path;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 9090;

fn print_usage() {
    println!("Usage: catwalk-ctl [--port N | --url URL] <command>");
    println!();
    println!("Commands:");
    println!("  status                    Check that catwalkd is up");
    println!("  info                      Show the mounted model");
    println!("  predict <file|->          POST a request envelope to /predict");
    println!("  test-server <model-dir>   Run conformance checks against the server");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut base = format!("http://127.0.0.1:{DEFAULT_PORT}");
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                let port: u16 = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
                base = format!("http://127.0.0.1:{port}");
            }
            "--url" => {
                i += 1;
                base = args
                    .get(i)
                    .context("--url requires a value")?
                    .trim_end_matches('/')
                    .to_string();
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | [] => cmd::status::cmd_status(&base).await,
        ["info"] => cmd::status::cmd_info(&base).await,
        ["predict", file] => cmd::predict::cmd_predict(&base, file).await,
        ["test-server", dir] => cmd::test_server::cmd_test_server(&base, Path::new(dir)).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
