//! The computation plugin contract.
//!
//! A computation is the opaque unit behind `/predict`. Computations are
//! not discovered from the filesystem: each one is registered under an
//! entry key with a factory, and a model's `model.yml` names the key.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use catwalk_core::Frame;

/// A model's own example inputs and the outputs it should produce for them.
#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    pub inputs: Frame,
    pub outputs: Frame,
}

/// Trait implemented by every servable computation.
///
/// `predict` receives and returns a `Frame` in the representation the
/// model's `io_type` declares. It may be called concurrently; an
/// implementation must be pure or internally synchronised.
pub trait Computation: Send + Sync {
    fn predict(&self, input: Frame) -> anyhow::Result<Frame>;

    /// Example data for conformance checks. Never called while serving.
    fn load_test_data(&self, model_dir: &Path) -> anyhow::Result<TestData>;
}

/// Builds a computation for the model directory it is mounted from.
pub type Factory = fn(&Path) -> anyhow::Result<Arc<dyn Computation>>;

/// Maps entry keys to computation factories.
#[derive(Clone, Default)]
pub struct ComputationRegistry {
    factories: HashMap<String, Factory>,
}

impl ComputationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the bundled example computations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register_all(&mut registry);
        registry
    }

    /// Register a factory. A later registration under the same key wins.
    pub fn register(&mut self, entry: &str, factory: Factory) {
        if self.factories.insert(entry.to_string(), factory).is_some() {
            tracing::debug!(entry, "computation factory replaced");
        }
    }

    pub fn get(&self, entry: &str) -> Option<Factory> {
        self.factories.get(entry).copied()
    }

    pub fn entries(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
