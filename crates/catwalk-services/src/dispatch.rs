//! Dispatch engine — turns a raw `/predict` body into a reply.
//!
//! Each request walks a fixed chain of stages:
//!
//! ```text
//! Received → Decoded → ValidatedIn → Identified → AdaptedIn
//!          → Computed → AdaptedOut → ValidatedOut → Responded
//! ```
//!
//! Failures before `Computed` are client errors (400/404). Failures after
//! it are server errors (500). A failure inside the computation itself is
//! not turned into a reply here: it comes back as `ComputationFailed` and
//! the host decides what to do with it.
//!
//! The engine holds no per-request state. Each call takes one snapshot of
//! the mount slot and uses only that snapshot.

use serde_json::{Map, Value};

use catwalk_core::envelope::{self, error_output, INPUT, MODEL, OUTPUT};
use catwalk_core::{identity, io};

use crate::mount::{Mount, MountSlot};

pub const NO_MODEL_LOADED: &str = "No model loaded.";
pub const MODEL_NOT_FOUND: &str = "Model not found.";
pub const JSON_PARSE_ERROR: &str = "Invalid POST data: JSON parse error.";

/// Stages of the dispatch chain. A reply records the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Decoded,
    ValidatedIn,
    Identified,
    AdaptedIn,
    Computed,
    AdaptedOut,
    ValidatedOut,
    Responded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    BadRequest,
    NotFound,
    ServerError,
}

impl ReplyStatus {
    pub fn http_code(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::ServerError => 500,
        }
    }
}

/// A finished reply: status, JSON body, and how far dispatch got.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub body: Value,
    pub stage: Stage,
}

impl Reply {
    fn ok(body: Value, stage: Stage) -> Self {
        Self {
            status: ReplyStatus::Ok,
            body,
            stage,
        }
    }

    /// An error reply: `echo` plus `output: { message }`.
    fn error(status: ReplyStatus, stage: Stage, message: &str, echo: Map<String, Value>) -> Self {
        let mut body = echo;
        body.insert(OUTPUT.to_string(), error_output(message));
        Self {
            status,
            body: Value::Object(body),
            stage,
        }
    }

    /// `output.message`, if this is an error reply.
    pub fn message(&self) -> Option<&str> {
        self.body.get(OUTPUT)?.get("message")?.as_str()
    }
}

/// Raised by a computation's `predict`. Never converted into a reply by
/// the engine.
#[derive(Debug, thiserror::Error)]
#[error("computation failed (correlation_id {correlation_id}): {cause:#}")]
pub struct ComputationFailed {
    pub correlation_id: String,
    /// Envelope fields to echo in whatever reply the host builds.
    pub echo: Map<String, Value>,
    pub cause: anyhow::Error,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Check each successful reply against the response envelope.
    pub validate_output: bool,
}

/// The per-request orchestrator. Cheap to clone; clones share the slot.
#[derive(Clone, Default)]
pub struct Dispatcher {
    slot: MountSlot,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(slot: MountSlot, options: DispatchOptions) -> Self {
        Self { slot, options }
    }

    pub fn slot(&self) -> &MountSlot {
        &self.slot
    }

    /// The `/info` reply: the mounted model's metadata.
    pub fn info(&self) -> Reply {
        match self.slot.current() {
            Some(mount) => Reply::ok(mount.meta().to_info_value(), Stage::Responded),
            None => Reply::error(
                ReplyStatus::ServerError,
                Stage::Received,
                NO_MODEL_LOADED,
                Map::new(),
            ),
        }
    }

    /// Run one `/predict` body through the full chain.
    pub fn predict(&self, body: &[u8]) -> Result<Reply, ComputationFailed> {
        match self.slot.current() {
            Some(mount) => self.predict_with(&mount, body),
            None => Ok(Reply::error(
                ReplyStatus::ServerError,
                Stage::Received,
                NO_MODEL_LOADED,
                Map::new(),
            )),
        }
    }

    fn predict_with(&self, mount: &Mount, body: &[u8]) -> Result<Reply, ComputationFailed> {
        // Received → Decoded
        let decoded: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "predict body is not JSON");
                return Ok(Reply::error(
                    ReplyStatus::BadRequest,
                    Stage::Received,
                    JSON_PARSE_ERROR,
                    Map::new(),
                ));
            }
        };

        // Decoded → ValidatedIn
        if let Err(e) = mount.request_validator().validate(&decoded) {
            return Ok(Reply::error(
                ReplyStatus::BadRequest,
                Stage::Decoded,
                &format!("Invalid POST data: {e}"),
                envelope::salvage(&decoded),
            ));
        }
        let Value::Object(mut env) = decoded else {
            // The request validator only accepts objects.
            return Ok(Reply::error(
                ReplyStatus::BadRequest,
                Stage::Decoded,
                "Invalid POST data: expected an object.",
                Map::new(),
            ));
        };

        // ValidatedIn → Identified
        let correlation_id = envelope::ensure_correlation_id(&mut env);
        envelope::ensure_model(&mut env, mount.identity());
        let requested = env.get(MODEL).cloned().unwrap_or(Value::Null);
        if !identity::matches(&requested, mount.identity()) {
            tracing::info!(%correlation_id, requested = %requested, "request addressed another model");
            return Ok(Reply::error(
                ReplyStatus::NotFound,
                Stage::ValidatedIn,
                MODEL_NOT_FOUND,
                env,
            ));
        }
        tracing::info!(%correlation_id, "data validated");

        // Identified → AdaptedIn
        let input = env.get(INPUT).cloned().unwrap_or(Value::Null);
        let adapted = match io::to_computation_input(input, mount.io_type()) {
            Ok(a) => a,
            Err(e) => {
                return Ok(Reply::error(
                    ReplyStatus::BadRequest,
                    Stage::Identified,
                    &format!("Invalid POST data: {e}"),
                    env,
                ))
            }
        };

        // AdaptedIn → Computed
        let result = mount
            .computation()
            .predict(adapted.frame)
            .map_err(|cause| ComputationFailed {
                correlation_id: correlation_id.clone(),
                echo: envelope::salvage_fields(&env),
                cause,
            })?;

        // Computed → AdaptedOut
        let output = match io::from_computation_output(
            result,
            mount.io_type(),
            adapted.was_single_record,
        ) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(%correlation_id, error = %e, "computation output could not be adapted");
                return Ok(Reply::error(
                    ReplyStatus::ServerError,
                    Stage::Computed,
                    &format!("Invalid model output: {e}"),
                    env,
                ));
            }
        };
        env.insert(OUTPUT.to_string(), output);
        let body = Value::Object(env);

        // AdaptedOut → ValidatedOut
        if self.options.validate_output {
            if let Err(e) = mount.response_validator().validate(&body) {
                tracing::error!(%correlation_id, error = %e, "reply failed the response envelope");
                let mut echo = envelope::salvage(&body);
                if let Some(input) = body.get(INPUT) {
                    echo.insert(INPUT.to_string(), input.clone());
                }
                return Ok(Reply::error(
                    ReplyStatus::ServerError,
                    Stage::AdaptedOut,
                    &format!("Invalid model output: {e}"),
                    echo,
                ));
            }
        }

        tracing::info!(%correlation_id, "returning response");
        Ok(Reply::ok(body, Stage::Responded))
    }
}
