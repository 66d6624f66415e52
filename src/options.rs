//! User choices and their resolved form.
//!
//! A [`Request`] is what the command line carries. [`prepare`] turns it into
//! [`GenerationOptions`]: the distro is checked against the index, the extra
//! files are read and parsed, and a default shared workspace is created when
//! sharing was asked for without any path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SavedConfiguration;
use crate::deps::{self, DependencyLists};
use crate::distro::{self, Generation, IndexSource};
use crate::error::{Error, Result};
use crate::mounts;

/// Extension required for extra env and dependency files.
pub const SOURCE_FILE_EXTENSION: &str = "txt";

/// Raw dependency file text alongside its parsed buckets.
///
/// The raw text is what gets saved, so a later regeneration parses the same
/// input again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraDependencies {
    pub source: String,
    pub lists: DependencyLists,
}

impl ExtraDependencies {
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let lists = deps::parse(&source)?;
        Ok(Self { source, lists })
    }
}

/// Fully resolved input of the artifact generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub container_name: String,
    pub image_name: String,
    pub distro: String,
    pub generation: Generation,
    pub simulator: bool,
    pub mount_paths: Vec<PathBuf>,
    pub share_mounts: bool,
    pub extra_env: Option<String>,
    pub extra_dependencies: Option<ExtraDependencies>,
}

/// Choices as given on the command line, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub container_name: Option<String>,
    pub image_name: Option<String>,
    pub distro: Option<String>,
    pub simulator: bool,
    pub mount_paths: Vec<PathBuf>,
    pub share_mounts: bool,
    pub env_file: Option<PathBuf>,
    pub dependencies_file: Option<PathBuf>,
}

/// Default container name for a distro.
pub fn default_name(distro: &str) -> String {
    format!("ros-{distro}")
}

/// Resolve a [`Request`], relative paths being taken from `base_dir`.
///
/// Nothing is written before the distro and the extra files are validated;
/// the default workspace directory is the only side effect.
pub fn prepare(
    request: &Request,
    index: &dyn IndexSource,
    base_dir: &Path,
) -> Result<GenerationOptions> {
    let resolved = distro::resolve(request.distro.as_deref(), index)?;

    let extra_env = request
        .env_file
        .as_deref()
        .map(|path| read_source_file(&base_dir.join(path)))
        .transpose()?;
    let extra_dependencies = request
        .dependencies_file
        .as_deref()
        .map(|path| read_source_file(&base_dir.join(path)).and_then(ExtraDependencies::parse))
        .transpose()?;

    let mut mount_paths = request.mount_paths.clone();
    if request.share_mounts && mount_paths.is_empty() {
        mount_paths.push(mounts::create_default_workspace(base_dir)?);
    }

    let container_name = request
        .container_name
        .clone()
        .unwrap_or_else(|| default_name(&resolved.name));
    let image_name = request
        .image_name
        .clone()
        .unwrap_or_else(|| container_name.clone());

    debug!(%container_name, %image_name, distro = %resolved.name, "options prepared");

    Ok(GenerationOptions {
        container_name,
        image_name,
        distro: resolved.name,
        generation: resolved.generation,
        simulator: request.simulator,
        mount_paths,
        share_mounts: request.share_mounts,
        extra_env,
        extra_dependencies,
    })
}

/// Rebuild options from a saved document, checking its distro again.
///
/// The index decides the generation. A saved generation that disagrees is
/// replaced, with a warning. Extra dependencies are parsed from the saved
/// raw text.
pub fn from_saved(
    mut document: SavedConfiguration,
    index: &dyn IndexSource,
) -> Result<GenerationOptions> {
    let resolved = distro::resolve(Some(document.ros.distro.as_str()), index)?;
    if resolved.generation != document.ros.generation {
        warn!(
            distro = %resolved.name,
            saved = %document.ros.generation,
            index = %resolved.generation,
            "saved generation disagrees with the index; using the index"
        );
        document.ros.generation = resolved.generation;
    }
    document.into_options()
}

/// Read an extra env or dependency file; it must be a regular `.txt` file.
pub fn read_source_file(path: &Path) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidSourceFile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if path.is_dir() {
        return Err(invalid("is a directory"));
    }
    if !path.is_file() {
        return Err(invalid("does not exist"));
    }
    if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_FILE_EXTENSION) {
        return Err(invalid("expected a .txt file"));
    }

    fs::read_to_string(path).map_err(|e| invalid(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distro::tests::{StaticIndex, SAMPLE_INDEX};
    use tempfile::TempDir;

    fn index() -> StaticIndex {
        StaticIndex(SAMPLE_INDEX)
    }

    #[test]
    fn test_prepare_defaults() {
        let temp = TempDir::new().unwrap();
        let options = prepare(&Request::default(), &index(), temp.path()).unwrap();

        assert_eq!(options.distro, "humble");
        assert_eq!(options.generation, Generation::GenTwo);
        assert_eq!(options.container_name, "ros-humble");
        assert_eq!(options.image_name, "ros-humble");
        assert!(options.mount_paths.is_empty());
        assert!(options.extra_env.is_none());
    }

    #[test]
    fn test_prepare_image_defaults_to_container_name() {
        let temp = TempDir::new().unwrap();
        let request = Request {
            container_name: Some("rover".into()),
            ..Default::default()
        };
        let options = prepare(&request, &index(), temp.path()).unwrap();
        assert_eq!(options.image_name, "rover");
    }

    #[test]
    fn test_prepare_shared_without_paths_creates_one_workspace() {
        let temp = TempDir::new().unwrap();
        let request = Request {
            share_mounts: true,
            ..Default::default()
        };
        let options = prepare(&request, &index(), temp.path()).unwrap();

        assert_eq!(options.mount_paths, [PathBuf::from("ros_ws")]);
        let created: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn test_prepare_unsupported_distro_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let request = Request {
            distro: Some("ardent".into()),
            share_mounts: true,
            ..Default::default()
        };
        let err = prepare(&request, &index(), temp.path()).unwrap_err();

        assert!(matches!(err, Error::UnsupportedDistribution { .. }));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_reads_extra_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("env.txt"), "ROS_DOMAIN_ID=7\n").unwrap();
        fs::write(temp.path().join("deps.txt"), "#APT\nlibserial-dev\n#PIP\npyserial\n").unwrap();
        let request = Request {
            env_file: Some("env.txt".into()),
            dependencies_file: Some("deps.txt".into()),
            ..Default::default()
        };

        let options = prepare(&request, &index(), temp.path()).unwrap();
        assert_eq!(options.extra_env.as_deref(), Some("ROS_DOMAIN_ID=7\n"));
        let deps = options.extra_dependencies.unwrap();
        assert_eq!(deps.lists.system, ["libserial-dev"]);
        assert_eq!(deps.lists.language, ["pyserial"]);
    }

    #[test]
    fn test_prepare_rejects_bucketless_dependency_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("deps.txt"), "foo\n#APT\nbar\n").unwrap();
        let request = Request {
            dependencies_file: Some("deps.txt".into()),
            ..Default::default()
        };
        let err = prepare(&request, &index(), temp.path()).unwrap_err();
        assert!(matches!(err, Error::NoBucketSelected { line: 1, .. }));
    }

    fn saved(distro: &str, generation: Generation) -> SavedConfiguration {
        SavedConfiguration::from(&GenerationOptions {
            container_name: format!("ros-{distro}"),
            image_name: format!("ros-{distro}"),
            distro: distro.into(),
            generation,
            simulator: false,
            mount_paths: vec!["ros_ws".into()],
            share_mounts: true,
            extra_env: None,
            extra_dependencies: Some(ExtraDependencies::parse("#PIP\npyserial\n").unwrap()),
        })
    }

    #[test]
    fn test_from_saved_keeps_document_fields() {
        let options = from_saved(saved("humble", Generation::GenTwo), &index()).unwrap();
        assert_eq!(options.container_name, "ros-humble");
        assert_eq!(options.mount_paths, [PathBuf::from("ros_ws")]);
        assert!(options.share_mounts);
        assert_eq!(options.extra_dependencies.unwrap().lists.language, ["pyserial"]);
    }

    #[test]
    fn test_from_saved_index_wins_on_generation() {
        let options = from_saved(saved("humble", Generation::GenOne), &index()).unwrap();
        assert_eq!(options.generation, Generation::GenTwo);

        let options = from_saved(saved("noetic", Generation::GenTwo), &index()).unwrap();
        assert_eq!(options.generation, Generation::GenOne);
    }

    #[test]
    fn test_from_saved_unknown_distro() {
        let err = from_saved(saved("ardent", Generation::GenTwo), &index()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDistribution { ref name } if name == "ardent"));
    }

    #[test]
    fn test_read_source_file_checks() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("env.env"), "A=1\n").unwrap();
        fs::create_dir(temp.path().join("dir.txt")).unwrap();

        for name in ["missing.txt", "env.env", "dir.txt"] {
            let err = read_source_file(&temp.path().join(name)).unwrap_err();
            assert!(
                matches!(err, Error::InvalidSourceFile { .. }),
                "{name}: {err}"
            );
        }
    }
}
