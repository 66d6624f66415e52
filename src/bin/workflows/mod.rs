mod create;
mod distros;
mod lifecycle;

pub(crate) use create::{create, create_from};
pub(crate) use distros::list_distros;
pub(crate) use lifecycle::{delete, run_lifecycle};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Directory the artifacts are written to and the engine runs in.
pub(crate) fn project_dir() -> Result<PathBuf> {
    std::env::current_dir().context("resolving current directory")
}
