//! Artifact generation.
//!
//! [`generate`] renders, from one set of [`GenerationOptions`]:
//!
//! - **`Dockerfile`** - base ROS image, packages, non-root account, workspace
//! - **`.env`** - display settings and the host identity
//! - **`docker-compose.yaml`** - the single service tying the two together
//!
//! Rendering is kept apart from writing ([`files`]) so the three texts can be
//! checked against each other without touching the disk.

pub mod compose;
pub mod dockerfile;
pub mod env_file;
pub mod files;

use std::path::Path;

use crate::error::Result;
use crate::identity::HostIdentity;
use crate::mounts;
use crate::options::GenerationOptions;

pub const DOCKERFILE_NAME: &str = "Dockerfile";
pub const ENV_FILE_NAME: &str = ".env";
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yaml";

/// Every file `create` writes, in write order.
pub const ARTIFACT_NAMES: &[&str] = &[DOCKERFILE_NAME, ENV_FILE_NAME, COMPOSE_FILE_NAME];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub dockerfile: String,
    pub env_file: String,
    pub compose: String,
}

impl Artifacts {
    /// `(file name, content)` pairs in [`ARTIFACT_NAMES`] order.
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            (DOCKERFILE_NAME, self.dockerfile.as_str()),
            (ENV_FILE_NAME, self.env_file.as_str()),
            (COMPOSE_FILE_NAME, self.compose.as_str()),
        ]
    }
}

/// Render all artifacts; mount paths are resolved against `base_dir`.
pub fn generate(
    options: &GenerationOptions,
    identity: &HostIdentity,
    base_dir: &Path,
) -> Result<Artifacts> {
    let mounts = mounts::resolve(&options.mount_paths, base_dir)?;
    Ok(Artifacts {
        dockerfile: dockerfile::render(options, &mounts),
        env_file: env_file::render(identity, options.extra_env.as_deref()),
        compose: compose::render(options, &mounts),
    })
}
