//! ROS distribution resolution against the upstream rosdistro index.
//!
//! The index (`index-v4.yaml`) maps every distribution codename to its
//! metadata. Only two fields matter here: `distribution_type`, which tells
//! ROS 1 from ROS 2, and `distribution_status`, which is surfaced when
//! listing distros and warned on for end-of-life releases.
//!
//! Fetching is behind [`IndexSource`] so resolution can be exercised without
//! the network.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Upstream index consulted when `ROS_ENV_INDEX_URL` is not set.
pub const INDEX_URL: &str = "https://raw.githubusercontent.com/ros/rosdistro/master/index-v4.yaml";

/// Distro used when none is requested.
pub const DEFAULT_DISTRO: &str = "humble";

/// Major ROS family of a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Generation {
    #[serde(rename = "ros1")]
    GenOne,
    #[serde(rename = "ros2")]
    GenTwo,
}

impl Generation {
    /// Infix used in generation-specific package names (`ros-<distro>-<prefix>-control`).
    pub fn package_prefix(self) -> &'static str {
        match self {
            Generation::GenOne => "ros",
            Generation::GenTwo => "ros2",
        }
    }

    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "ros1" => Some(Generation::GenOne),
            "ros2" => Some(Generation::GenTwo),
            _ => None,
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::GenOne => write!(f, "ros1"),
            Generation::GenTwo => write!(f, "ros2"),
        }
    }
}

/// A distro name confirmed against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDistro {
    pub name: String,
    pub generation: Generation,
}

/// One row of the index listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroSummary {
    pub name: String,
    pub generation: Generation,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndexDocument {
    distributions: BTreeMap<String, DistributionEntry>,
}

#[derive(Debug, Deserialize)]
struct DistributionEntry {
    distribution_type: Option<String>,
    distribution_status: Option<String>,
}

/// Something that can hand back the raw index document.
pub trait IndexSource {
    fn fetch(&self) -> Result<String>;
}

/// Blocking HTTP fetch of the index.
///
/// No timeout is configured: a stalled upstream blocks the command.
#[derive(Debug, Clone)]
pub struct HttpIndex {
    url: String,
}

impl HttpIndex {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Index at `ROS_ENV_INDEX_URL`, or the upstream rosdistro index.
    pub fn from_env() -> Self {
        Self::new(env::var("ROS_ENV_INDEX_URL").unwrap_or_else(|_| INDEX_URL.to_string()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl IndexSource for HttpIndex {
    fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching distribution index");
        let upstream = |e: reqwest::Error| Error::UpstreamUnavailable {
            reason: format!("fetching '{}': {e}", self.url),
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(upstream)?;
        client
            .get(&self.url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(upstream)
    }
}

fn parse_index(raw: &str) -> Result<IndexDocument> {
    serde_yaml::from_str(raw).map_err(|e| Error::UpstreamUnavailable {
        reason: format!("parsing distribution index: {e}"),
    })
}

fn generation_of(name: &str, entry: &DistributionEntry) -> Result<Generation> {
    let marker = entry
        .distribution_type
        .as_deref()
        .ok_or_else(|| Error::UpstreamUnavailable {
            reason: format!("index entry '{name}' has no distribution_type"),
        })?;
    Generation::from_marker(marker).ok_or_else(|| Error::UpstreamUnavailable {
        reason: format!("index entry '{name}' has unknown distribution_type '{marker}'"),
    })
}

/// Validate `requested` (or [`DEFAULT_DISTRO`]) against the index and classify it.
pub fn resolve(requested: Option<&str>, source: &dyn IndexSource) -> Result<ResolvedDistro> {
    let name = requested.unwrap_or(DEFAULT_DISTRO);
    let index = parse_index(&source.fetch()?)?;

    let entry = index
        .distributions
        .get(name)
        .ok_or_else(|| Error::UnsupportedDistribution {
            name: name.to_string(),
        })?;
    let generation = generation_of(name, entry)?;

    if entry.distribution_status.as_deref() == Some("end-of-life") {
        warn!(distro = name, "distro is end-of-life upstream");
    }
    debug!(distro = name, %generation, "distro resolved");

    Ok(ResolvedDistro {
        name: name.to_string(),
        generation,
    })
}

/// Every distribution in the index, sorted by name.
///
/// Entries without a recognised `distribution_type` are skipped rather than
/// failing the whole listing.
pub fn list(source: &dyn IndexSource) -> Result<Vec<DistroSummary>> {
    let index = parse_index(&source.fetch()?)?;
    Ok(index
        .distributions
        .iter()
        .filter_map(|(name, entry)| {
            let generation = generation_of(name, entry).ok()?;
            Some(DistroSummary {
                name: name.clone(),
                generation,
                status: entry.distribution_status.clone(),
            })
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_INDEX: &str = "\
%YAML 1.1
---
distributions:
  humble:
    distribution: [humble/distribution.yaml]
    distribution_cache: http://repo.ros2.org/rosdistro_cache/humble-cache.yaml.gz
    distribution_status: active
    distribution_type: ros2
    python_version: 3
  melodic:
    distribution_status: end-of-life
    distribution_type: ros1
  noetic:
    distribution_status: end-of-life
    distribution_type: ros1
  rolling:
    distribution_status: rolling
    distribution_type: ros2
type: index
version: 4
";

    pub(crate) struct StaticIndex(pub(crate) &'static str);

    impl IndexSource for StaticIndex {
        fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct OfflineIndex;

    impl IndexSource for OfflineIndex {
        fn fetch(&self) -> Result<String> {
            Err(Error::UpstreamUnavailable {
                reason: "network unreachable".into(),
            })
        }
    }

    #[test]
    fn test_resolve_defaults_to_humble() {
        let resolved = resolve(None, &StaticIndex(SAMPLE_INDEX)).unwrap();
        assert_eq!(resolved.name, "humble");
        assert_eq!(resolved.generation, Generation::GenTwo);
    }

    #[test]
    fn test_resolve_ros1_distro() {
        let resolved = resolve(Some("noetic"), &StaticIndex(SAMPLE_INDEX)).unwrap();
        assert_eq!(resolved.generation, Generation::GenOne);
        assert_eq!(resolved.generation.package_prefix(), "ros");
    }

    #[test]
    fn test_resolve_unknown_distro() {
        let err = resolve(Some("bouncy"), &StaticIndex(SAMPLE_INDEX)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDistribution { ref name } if name == "bouncy"));
    }

    #[test]
    fn test_resolve_surfaces_fetch_failure() {
        let err = resolve(Some("humble"), &OfflineIndex).unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable { .. }));
    }

    #[test]
    fn test_resolve_rejects_malformed_index() {
        let err = resolve(Some("humble"), &StaticIndex("distributions: [oops")).unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable { .. }));

        let err = resolve(Some("humble"), &StaticIndex("type: index\n")).unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable { .. }));
    }

    #[test]
    fn test_resolve_rejects_unknown_marker() {
        let index = "distributions:\n  odd:\n    distribution_type: ros3\n";
        let err = resolve(Some("odd"), &StaticIndex(index)).unwrap_err();
        assert!(err.to_string().contains("ros3"));
    }

    #[test]
    fn test_list_is_sorted() {
        let names: Vec<_> = list(&StaticIndex(SAMPLE_INDEX))
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["humble", "melodic", "noetic", "rolling"]);
    }

    #[test]
    fn test_generation_display_matches_marker() {
        assert_eq!(Generation::GenOne.to_string(), "ros1");
        assert_eq!(Generation::GenTwo.to_string(), "ros2");
    }
}
