//! Identity of the invoking host user.
//!
//! Captured once at the start of a generation and passed to the generator
//! as plain data, so the container account mirrors the host account and
//! files created in bind mounts keep the right owner.

use std::env;
use std::fs;
use std::path::Path;

use nix::unistd::{getgid, getuid};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub uid: u32,
    pub gid: u32,
    pub user: String,
    pub group: String,
}

impl HostIdentity {
    /// Capture the real uid/gid of this process and resolve their names.
    pub fn capture() -> Self {
        Self::resolve(Path::new("/"), getuid().as_raw(), getgid().as_raw())
    }

    /// Resolve names for `uid`/`gid` from the account databases under `root`.
    ///
    /// The user falls back to `$USER`, then to the numeric uid. The group
    /// falls back to the user name.
    pub fn resolve(root: &Path, uid: u32, gid: u32) -> Self {
        let user = lookup_name(&root.join("etc/passwd"), uid)
            .or_else(|| env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| uid.to_string());
        let group = lookup_name(&root.join("etc/group"), gid).unwrap_or_else(|| user.clone());
        debug!(uid, gid, %user, %group, "host identity");
        Self {
            uid,
            gid,
            user,
            group,
        }
    }
}

/// Find the name owning `id` in a passwd- or group-format file.
///
/// Both formats keep the name in field 0 and the numeric id in field 2.
/// A missing or unreadable file resolves to `None`.
fn lookup_name(path: &Path, id: u32) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    content.lines().find_map(|line| {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() >= 3 && parts[2].parse::<u32>().ok()? == id {
            Some(parts[0].to_string())
        } else {
            None
        }
    })
}
