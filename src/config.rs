//! Saved configuration (`.ros_env_param.yaml`).
//!
//! Persists the resolved [`GenerationOptions`] so later commands can find the
//! container and image again and `create_from` can regenerate identical
//! artifacts. Extra env and dependency files are stored as their raw text.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distro::Generation;
use crate::error::{Error, Result};
use crate::options::{ExtraDependencies, GenerationOptions};

pub const DEFAULT_CONFIG_PATH: &str = ".ros_env_param.yaml";

const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedConfiguration {
    pub container_name: String,
    pub image_name: String,
    pub ros: SavedDistro,
    pub options: SavedOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedDistro {
    pub distro: String,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedOptions {
    pub simulator: bool,
    pub share_mounts: bool,
    #[serde(default)]
    pub mount_paths: Vec<PathBuf>,
    #[serde(default)]
    pub extra_env: Option<String>,
    #[serde(default)]
    pub extra_dependencies: Option<String>,
}

impl From<&GenerationOptions> for SavedConfiguration {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            container_name: options.container_name.clone(),
            image_name: options.image_name.clone(),
            ros: SavedDistro {
                distro: options.distro.clone(),
                generation: options.generation,
            },
            options: SavedOptions {
                simulator: options.simulator,
                share_mounts: options.share_mounts,
                mount_paths: options.mount_paths.clone(),
                extra_env: options.extra_env.clone(),
                extra_dependencies: options
                    .extra_dependencies
                    .as_ref()
                    .map(|d| d.source.clone()),
            },
        }
    }
}

impl SavedConfiguration {
    /// Rebuild the options; the dependency text is parsed again.
    pub fn into_options(self) -> Result<GenerationOptions> {
        let extra_dependencies = self
            .options
            .extra_dependencies
            .map(ExtraDependencies::parse)
            .transpose()?;
        Ok(GenerationOptions {
            container_name: self.container_name,
            image_name: self.image_name,
            distro: self.ros.distro,
            generation: self.ros.generation,
            simulator: self.options.simulator,
            mount_paths: self.options.mount_paths,
            share_mounts: self.options.share_mounts,
            extra_env: self.options.extra_env,
            extra_dependencies,
        })
    }
}

/// Serialize `options` to `path`, replacing any previous document.
pub fn save(path: &Path, options: &GenerationOptions) -> Result<()> {
    let document = serde_yaml::to_string(&SavedConfiguration::from(options)).map_err(|e| {
        Error::ArtifactWriteFailed {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        }
    })?;
    fs::write(path, document).map_err(|source| Error::ArtifactWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "saved configuration written");
    Ok(())
}

/// Read the document at `path` without re-deriving any options.
///
/// A document sharing mounts must list at least one mount path.
pub fn load_document(path: &Path) -> Result<SavedConfiguration> {
    let not_config = |reason: &str| Error::NotAConfigFile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if !path.is_file() {
        return Err(not_config("no such file"));
    }
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !CONFIG_EXTENSIONS.contains(&extension) {
        return Err(not_config("expected a .yaml file"));
    }

    let malformed = |reason: String| Error::MalformedConfig {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let document: SavedConfiguration =
        serde_yaml::from_str(&text).map_err(|e| malformed(e.to_string()))?;
    if document.options.share_mounts && document.options.mount_paths.is_empty() {
        return Err(malformed(
            "share_mounts is set but mount_paths is empty".to_string(),
        ));
    }
    Ok(document)
}

/// Load saved options from `path`.
pub fn load(path: &Path) -> Result<GenerationOptions> {
    load_document(path)?
        .into_options()
        .map_err(|e| Error::MalformedConfig {
            path: path.to_path_buf(),
            reason: format!("extra_dependencies: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn default_path(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_PATH)
    }

    fn sample() -> GenerationOptions {
        GenerationOptions {
            container_name: "rover".into(),
            image_name: "rover-img".into(),
            distro: "jazzy".into(),
            generation: Generation::GenTwo,
            simulator: true,
            mount_paths: vec!["ros_ws".into(), "/opt/maps".into()],
            share_mounts: true,
            extra_env: Some("ROS_DOMAIN_ID=7\nTURTLEBOT3_MODEL=burger\n".into()),
            extra_dependencies: Some(
                ExtraDependencies::parse("#APT\nlibserial-dev\n# pinned\n#PIP\npyserial\n")
                    .unwrap(),
            ),
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = default_path(temp.path());

        save(&path, &sample()).unwrap();
        assert_eq!(load(&path).unwrap(), sample());
    }

    #[test]
    fn test_round_trip_without_extras() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("env.yml");
        let mut options = sample();
        options.extra_env = None;
        options.extra_dependencies = None;
        options.mount_paths.clear();
        options.share_mounts = false;

        save(&path, &options).unwrap();
        assert_eq!(load(&path).unwrap(), options);
    }

    #[test]
    fn test_saved_document_layout() {
        let temp = TempDir::new().unwrap();
        let path = default_path(temp.path());
        save(&path, &sample()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("container_name: rover\nimage_name: rover-img\nros:\n"));
        assert!(text.contains("  generation: ros2\n"));
    }

    #[test]
    fn test_load_missing_or_wrong_extension() {
        let temp = TempDir::new().unwrap();
        let err = load(&temp.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::NotAConfigFile { .. }));

        let txt = temp.path().join("params.txt");
        fs::write(&txt, "container_name: x\n").unwrap();
        let err = load(&txt).unwrap_err();
        assert!(matches!(err, Error::NotAConfigFile { .. }));
    }

    #[test]
    fn test_load_malformed_document() {
        let temp = TempDir::new().unwrap();
        let path = default_path(temp.path());

        fs::write(&path, "container_name: [unterminated\n").unwrap();
        assert!(matches!(load(&path).unwrap_err(), Error::MalformedConfig { .. }));

        fs::write(&path, "container_name: x\nimage_name: x\n").unwrap();
        assert!(matches!(load(&path).unwrap_err(), Error::MalformedConfig { .. }));
    }

    #[test]
    fn test_load_rejects_shared_without_paths() {
        let temp = TempDir::new().unwrap();
        let path = default_path(temp.path());
        let mut document = SavedConfiguration::from(&sample());
        document.options.mount_paths.clear();
        fs::write(&path, serde_yaml::to_string(&document).unwrap()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedConfig { ref reason, .. } if reason.contains("mount_paths")
        ));

        let omitted = "container_name: x\nimage_name: x\nros:\n  distro: humble\n  \
                       generation: ros2\noptions:\n  simulator: false\n  share_mounts: true\n";
        fs::write(&path, omitted).unwrap();
        assert!(matches!(
            load_document(&path).unwrap_err(),
            Error::MalformedConfig { .. }
        ));
    }

    #[test]
    fn test_load_rejects_bad_dependency_text() {
        let temp = TempDir::new().unwrap();
        let path = default_path(temp.path());
        let mut document = SavedConfiguration::from(&sample());
        document.options.extra_dependencies = Some("orphan\n".into());
        fs::write(&path, serde_yaml::to_string(&document).unwrap()).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedConfig { ref reason, .. } if reason.contains("orphan")
        ));
    }
}
