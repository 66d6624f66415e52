//! Flat dependency list format.
//!
//! ```text
//! #APT
//! libserial-dev
//! # comments and blank lines are ignored
//! #PIP
//! pyserial
//! ```
//!
//! A line containing `#APT` or `#PIP` selects the bucket for the lines that
//! follow. Every other non-empty line not starting with `#` is a dependency
//! and is kept verbatim.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const SYSTEM_MARKER: &str = "#APT";
pub const LANGUAGE_MARKER: &str = "#PIP";

/// Parsed dependency buckets: apt packages and pip packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLists {
    pub system: Vec<String>,
    pub language: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    System,
    Language,
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Marker(Bucket),
    Ignored,
    Dependency(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.contains(SYSTEM_MARKER) {
        Line::Marker(Bucket::System)
    } else if line.contains(LANGUAGE_MARKER) {
        Line::Marker(Bucket::Language)
    } else if line.is_empty() || line.starts_with('#') {
        Line::Ignored
    } else {
        Line::Dependency(line)
    }
}

/// Parse a dependency file into its two buckets.
pub fn parse(text: &str) -> Result<DependencyLists> {
    let (_, lists) = text.lines().enumerate().try_fold(
        (None, DependencyLists::default()),
        |(bucket, mut lists), (index, line)| match classify(line) {
            Line::Marker(selected) => Ok((Some(selected), lists)),
            Line::Ignored => Ok((bucket, lists)),
            Line::Dependency(dep) => {
                match bucket {
                    Some(Bucket::System) => lists.system.push(dep.to_string()),
                    Some(Bucket::Language) => lists.language.push(dep.to_string()),
                    None => {
                        return Err(Error::NoBucketSelected {
                            line: index + 1,
                            text: dep.to_string(),
                        })
                    }
                }
                Ok((bucket, lists))
            }
        },
    )?;
    Ok(lists)
}
