//! Writing and removing the generated artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Artifacts, ARTIFACT_NAMES};
use crate::error::{Error, Result};

/// Write one artifact, creating parent directories as needed.
pub fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    let failed = |source: io::Error| Error::ArtifactWriteFailed {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(failed)?;
    }
    fs::write(&path, content).map_err(failed)?;
    debug!(path = %path.display(), bytes = content.len(), "artifact written");
    Ok(path)
}

/// Write all three artifacts in order, stopping at the first failure.
pub fn write_artifacts(dir: &Path, artifacts: &Artifacts) -> Result<Vec<PathBuf>> {
    artifacts
        .entries()
        .into_iter()
        .map(|(name, content)| write_artifact(dir, name, content))
        .collect()
}

/// Outcome of removing one artifact.
#[derive(Debug)]
pub enum Removal {
    Removed(PathBuf),
    Missing(PathBuf),
    Failed(PathBuf, io::Error),
}

/// Remove every generated artifact that exists; failures do not stop the rest.
pub fn remove_artifacts(dir: &Path) -> Vec<Removal> {
    ARTIFACT_NAMES
        .iter()
        .map(|name| {
            let path = dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => Removal::Removed(path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Removal::Missing(path),
                Err(e) => Removal::Failed(path, e),
            }
        })
        .collect()
}
