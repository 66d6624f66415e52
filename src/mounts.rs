//! Host folders made available inside the container.
//!
//! Every mount lands at `/home/${USER}/<base name>`, so base names must be
//! unique across the mount list.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Base name of the workspace created when sharing is requested without paths.
pub const DEFAULT_WORKSPACE: &str = "ros_ws";

/// A mount path ready for templating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// The path as given, used as the build-context source of a copy step.
    pub source: PathBuf,
    /// Absolute host path, used as the bind-mount source.
    pub host: PathBuf,
    /// Base folder name, the last component of the container target.
    pub name: String,
}

impl Mount {
    /// Container-side target, with `${USER}` left for the engine to expand.
    pub fn target(&self) -> String {
        format!("/home/${{USER}}/{}", self.name)
    }
}

/// Turn mount paths into [`Mount`]s relative to `base_dir`.
///
/// Fails with [`Error::InvalidMount`] when a path has no base folder name or
/// two distinct paths share one.
pub fn resolve(paths: &[PathBuf], base_dir: &Path) -> Result<Vec<Mount>> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut mounts = Vec::with_capacity(paths.len());

    for path in paths {
        let host = absolute(base_dir, path);
        let name = host
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidMount {
                path: path.clone(),
                reason: "path has no usable folder name".to_string(),
            })?;

        if let Some(previous) = seen.get(&name) {
            return Err(Error::InvalidMount {
                path: path.clone(),
                reason: format!(
                    "folder name '{name}' is already used by '{}'",
                    previous.display()
                ),
            });
        }
        seen.insert(name.clone(), path);

        mounts.push(Mount {
            source: path.clone(),
            host,
            name,
        });
    }

    Ok(mounts)
}

/// Create the first free `ros_ws`, `ros_ws_1`, ... directory under `base_dir`.
///
/// Returns the created path relative to `base_dir`.
pub fn create_default_workspace(base_dir: &Path) -> Result<PathBuf> {
    for index in 0.. {
        let name = if index == 0 {
            DEFAULT_WORKSPACE.to_string()
        } else {
            format!("{DEFAULT_WORKSPACE}_{index}")
        };
        let candidate = base_dir.join(&name);
        match fs::create_dir(&candidate) {
            Ok(()) => {
                info!(path = %candidate.display(), "created shared workspace");
                return Ok(PathBuf::from(name));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "workspace name taken");
            }
            Err(source) => {
                return Err(Error::ArtifactWriteFailed {
                    path: candidate,
                    source,
                })
            }
        }
    }
    unreachable!("workspace suffixes are unbounded")
}

/// Absolute form of `path`, canonicalised when it exists on disk.
fn absolute(base_dir: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    };
    fs::canonicalize(&joined).unwrap_or(joined)
}
