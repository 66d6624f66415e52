//! Error taxonomy shared by every ros-env component.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("distro '{name}' is not listed in the ROS distribution index")]
    UnsupportedDistribution { name: String },

    #[error("ROS distribution index unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("invalid source file '{}': {reason}", path.display())]
    InvalidSourceFile { path: PathBuf, reason: String },

    #[error("dependency line {line} ('{text}') appears before any #APT or #PIP marker")]
    NoBucketSelected { line: usize, text: String },

    #[error("writing artifact '{}'", path.display())]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' is not a saved configuration: {reason}", path.display())]
    NotAConfigFile { path: PathBuf, reason: String },

    #[error("malformed saved configuration '{}': {reason}", path.display())]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("invalid mount '{}': {reason}", path.display())]
    InvalidMount { path: PathBuf, reason: String },

    #[error("`{command}` exited with status {status}: {stderr}")]
    EngineCommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("container engine unavailable: {reason}")]
    EngineUnavailable { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
