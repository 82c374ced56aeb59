//! catwalkd — Catwalk model server.
//!
//! Usage: catwalkd [MODEL_DIR]
//!
//! MODEL_DIR overrides `model.path` from the config file.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use catwalk_api::ApiState;
use catwalk_core::config::CatwalkConfig;
use catwalk_services::{conformance, ComputationRegistry, DispatchOptions, Dispatcher, MountSlot};

#[tokio::main]
async fn main() -> Result<()> {
    // Config is read before logging is up, so its failures are reported after.
    let write_err = CatwalkConfig::write_default_if_missing().err();
    let (mut config, config_err) = match CatwalkConfig::load() {
        Ok(c) => (c, None),
        Err(e) => (CatwalkConfig::default(), Some(e)),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = write_err {
        tracing::warn!(error = %e, "failed to write default config");
    }
    if let Some(e) = config_err {
        tracing::warn!(error = %e, "failed to load config, using defaults");
    }
    if let Some(dir) = std::env::args().nth(1) {
        config.model.path = PathBuf::from(dir);
    }
    tracing::info!(
        model = %config.model.path.display(),
        run_tests = config.model.run_tests,
        validate_output = config.server.validate_output,
        "catwalkd starting"
    );

    // ── Mount ────────────────────────────────────────────────────────────────

    let registry = ComputationRegistry::with_builtins();
    let slot = MountSlot::new();
    match catwalk_services::load(&config.model.path, &registry) {
        Ok(mount) => {
            if config.model.run_tests {
                conformance::check(&mount, &config.model.path)
                    .context("model failed its conformance checks")?;
            }
            slot.replace(mount);
        }
        Err(e) => {
            // Keep serving: /status stays up and /info, /predict report
            // "No model loaded." until a remount succeeds.
            tracing::error!(error = %e, "failed to load model, serving without one");
        }
    }

    #[cfg(unix)]
    spawn_remount_on_sighup(slot.clone(), registry, config.clone());

    // ── Serve ────────────────────────────────────────────────────────────────

    let dispatcher = Dispatcher::new(
        slot,
        DispatchOptions {
            validate_output: config.server.validate_output,
        },
    );
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr()))?;

    catwalk_api::serve(ApiState::new(dispatcher), addr, shutdown_signal()).await?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Reload the model directory on SIGHUP. A failed reload keeps the
/// current mount.
#[cfg(unix)]
fn spawn_remount_on_sighup(slot: MountSlot, registry: ComputationRegistry, config: CatwalkConfig) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "SIGHUP handler unavailable, remount disabled");
                return;
            }
        };
        while hup.recv().await.is_some() {
            tracing::info!(path = %config.model.path.display(), "SIGHUP: remounting model");
            let mount = match catwalk_services::load(&config.model.path, &registry) {
                Ok(m) => m,
                Err(e) => {
                    tracing::error!(error = %e, "remount failed, keeping current model");
                    continue;
                }
            };
            if config.model.run_tests {
                if let Err(e) = conformance::check(&mount, &config.model.path) {
                    tracing::error!(error = %e, "remount failed conformance, keeping current model");
                    continue;
                }
            }
            slot.replace(mount);
        }
    });
}
