//! Loads a model directory into a `Mount`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use catwalk_core::{MetaError, ModelMeta};

use crate::computation::ComputationRegistry;
use crate::mount::Mount;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model directory {0} does not exist")]
    MissingDir(PathBuf),
    #[error(transparent)]
    Meta(#[from] MetaError),
    #[error("no computation registered for entry {entry:?} (known: {known})")]
    UnknownEntry { entry: String, known: String },
    #[error("failed to construct computation {entry:?}: {cause:#}")]
    Construct { entry: String, cause: anyhow::Error },
}

/// Read `<path>/model.yml`, resolve its computation in `registry`, build it,
/// and compile the mount's validators.
pub fn load(path: &Path, registry: &ComputationRegistry) -> Result<Mount, LoadError> {
    let dir = std::fs::canonicalize(path).map_err(|_| LoadError::MissingDir(path.to_path_buf()))?;
    if !dir.is_dir() {
        return Err(LoadError::MissingDir(dir));
    }

    let meta = ModelMeta::from_dir(&dir)?;
    let entry = meta.entry().to_string();
    let factory = registry.get(&entry).ok_or_else(|| LoadError::UnknownEntry {
        entry: entry.clone(),
        known: registry.entries().join(", "),
    })?;

    let computation = factory(&dir).map_err(|cause| LoadError::Construct {
        entry: entry.clone(),
        cause,
    })?;

    let mount = Mount::new(meta, computation)?;
    tracing::info!(
        path = %dir.display(),
        entry,
        model = %mount.identity(),
        "model loaded"
    );
    Ok(mount)
}
