//! Preflight checks for the container engine.
//!
//! Lifecycle commands need an engine binary before anything else runs. The
//! binary comes from `ROS_ENV_ENGINE` when set, otherwise `docker` on `PATH`.
//!
//! # Example
//!
//! ```rust
//! use ros_env::preflight::check_required_tools;
//!
//! let tools = &[("docker", "docker-ce or docker.io")];
//! match check_required_tools(tools) {
//!     Ok(paths) => println!("docker at {}", paths[0].display()),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

use std::env;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable naming the engine binary.
pub const ENGINE_ENV: &str = "ROS_ENV_ENGINE";

/// Engine binary looked up on `PATH` by default.
pub const DEFAULT_ENGINE: &str = "docker";

/// Host tools needed by lifecycle commands.
///
/// Each tuple is (command_name, package_name).
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[(DEFAULT_ENGINE, "docker-ce or docker.io")];

/// Locate specific tools on `PATH`.
///
/// Returns their paths in the order given, or [`Error::EngineUnavailable`]
/// listing every missing tool with the package that provides it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::with_capacity(tools.len());
    let mut missing = Vec::new();

    for (tool, package) in tools {
        match which::which(tool) {
            Ok(path) => found.push(path),
            Err(_) => missing.push(format!("  {} (install: {})", tool, package)),
        }
    }

    if !missing.is_empty() {
        return Err(Error::EngineUnavailable {
            reason: format!("missing required host tools:\n{}", missing.join("\n")),
        });
    }

    Ok(found)
}

/// Locate the engine binary.
pub fn engine_program() -> Result<PathBuf> {
    engine_program_from(env::var_os(ENGINE_ENV).map(PathBuf::from))
}

fn engine_program_from(configured: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(program) = configured.filter(|p| !p.as_os_str().is_empty()) {
        debug!(program = %program.display(), "engine from {}", ENGINE_ENV);
        return which::which(&program).map_err(|e| Error::EngineUnavailable {
            reason: format!("{}={} is not runnable: {e}", ENGINE_ENV, program.display()),
        });
    }
    check_required_tools(REQUIRED_TOOLS)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::EngineUnavailable {
            reason: format!("locating '{}'", DEFAULT_ENGINE),
        })
}
