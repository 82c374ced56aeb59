//! Mounted computations and the slot that holds the current one.
//!
//! A `Mount` is built once and never mutated. Remounting builds a new
//! `Mount` and swaps it into the `MountSlot`; requests already holding a
//! snapshot finish against the mount they started with.

use std::sync::{Arc, RwLock};

use catwalk_core::envelope::{build_request_envelope, build_response_envelope, io_validator};
use catwalk_core::{Identity, IoType, MetaError, ModelMeta, Validator};

use crate::computation::Computation;

/// A loaded computation plus everything compiled from its metadata.
pub struct Mount {
    meta: ModelMeta,
    identity: Identity,
    io_type: IoType,
    request: Validator,
    response: Validator,
    computation: Arc<dyn Computation>,
}

impl Mount {
    /// Compile validators from `meta` and pair them with `computation`.
    ///
    /// Fails on metadata problems, including descriptors that do not
    /// compile, so those surface at mount time rather than per request.
    pub fn new(meta: ModelMeta, computation: Arc<dyn Computation>) -> Result<Self, MetaError> {
        meta.check()?;
        let io_type = meta.io_type();
        let input = io_validator(&meta.input_descriptor()?, io_type);
        let output = io_validator(&meta.output_descriptor()?, io_type);
        let request = build_request_envelope(input.clone());
        let response = build_response_envelope(input, output, true);
        Ok(Self {
            identity: meta.identity(),
            io_type,
            request,
            response,
            meta,
            computation,
        })
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn io_type(&self) -> IoType {
        self.io_type
    }

    pub fn request_validator(&self) -> &Validator {
        &self.request
    }

    pub fn response_validator(&self) -> &Validator {
        &self.response
    }

    pub fn computation(&self) -> &dyn Computation {
        self.computation.as_ref()
    }
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mount")
            .field("identity", &self.identity)
            .field("io_type", &self.io_type)
            .finish_non_exhaustive()
    }
}

/// Shared holder of the current mount, if any.
#[derive(Clone, Default)]
pub struct MountSlot {
    current: Arc<RwLock<Option<Arc<Mount>>>>,
}

impl MountSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mount(mount: Mount) -> Self {
        let slot = Self::new();
        slot.replace(mount);
        slot
    }

    /// Snapshot of the current mount.
    pub fn current(&self) -> Option<Arc<Mount>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically install `mount`, returning the one it replaced.
    pub fn replace(&self, mount: Mount) -> Option<Arc<Mount>> {
        tracing::info!(model = %mount.identity(), io_type = %mount.io_type(), "model mounted");
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(Arc::new(mount))
    }

    /// Remove the current mount.
    pub fn clear(&self) -> Option<Arc<Mount>> {
        self.current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn is_mounted(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::builtin::{DataFrameNeuron, Neuron};

    pub(crate) fn neuron_meta(name: &str, version: &str) -> ModelMeta {
        ModelMeta::from_yaml_str(&format!(
            r#"
name: {name}
version: {version}
contact: {{ name: Test, email: test@example.com }}
schema:
  input:
    type: object
    properties:
      inputs: {{ type: array, items: {{ type: number }} }}
      weights: {{ type: array, items: {{ type: number }} }}
  output:
    type: object
    properties:
      activation: {{ type: number }}
"#
        ))
        .unwrap()
    }

    pub(crate) fn neuron_mount(name: &str, version: &str) -> Mount {
        Mount::new(neuron_meta(name, version), Arc::new(Neuron)).unwrap()
    }

    pub(crate) fn tabular_mount() -> Mount {
        let mut meta = neuron_meta("frame", "2.0.0");
        meta.io_type = Some("TABULAR".to_string());
        Mount::new(meta, Arc::new(DataFrameNeuron)).unwrap()
    }

    #[test]
    fn mount_compiles_validators() {
        let m = neuron_mount("demo", "1.0.0");
        assert_eq!(m.identity(), &Identity::new("demo", "1.0.0"));
        assert_eq!(m.io_type(), IoType::RecordList);
        assert!(m
            .request_validator()
            .accepts(&serde_json::json!({ "input": { "inputs": [1], "weights": [1] } })));
    }

    #[test]
    fn bad_metadata_fails_at_mount_time() {
        let mut meta = neuron_meta("demo", "1.0.0");
        meta.schema.input = serde_json::json!({ "type": "tensor" });
        assert!(Mount::new(meta, Arc::new(Neuron)).is_err());
    }

    #[test]
    fn slot_swaps_atomically() {
        let slot = MountSlot::new();
        assert!(!slot.is_mounted());

        slot.replace(neuron_mount("demo", "1.0.0"));
        let before = slot.current().unwrap();

        let old = slot.replace(neuron_mount("demo", "2.0.0")).unwrap();
        assert_eq!(old.identity().version, "1.0.0");

        // A snapshot taken before the swap still sees the old mount.
        assert_eq!(before.identity().version, "1.0.0");
        assert_eq!(slot.current().unwrap().identity().version, "2.0.0");

        slot.clear();
        assert!(slot.current().is_none());
    }
}
