//! Container engine boundary.
//!
//! Every interaction with the engine is one [`EngineCall`]. [`DockerCli`]
//! maps calls onto `docker` child processes; tests substitute a recording
//! fake through the [`ContainerEngine`] trait.

use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// One engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    ListRunning(String),
    ListAll(String),
    ListImages(String),
    Start(String),
    Stop(String),
    RemoveContainer(String),
    RemoveImage(String),
    ComposeBuild,
    ComposeUp,
    AttachShell(String),
}

/// How a call's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// stdout and stderr collected for inspection.
    Captured,
    /// stdout forwarded line by line while waiting; stderr inherited.
    Streamed,
    /// All streams handed to the child.
    Inherited,
}

impl EngineCall {
    pub fn output_mode(&self) -> OutputMode {
        match self {
            EngineCall::ComposeUp => OutputMode::Streamed,
            EngineCall::ComposeBuild | EngineCall::AttachShell(_) => OutputMode::Inherited,
            _ => OutputMode::Captured,
        }
    }

    /// Whether the call changes container or image state.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            EngineCall::ListRunning(_) | EngineCall::ListAll(_) | EngineCall::ListImages(_)
        )
    }

    /// Arguments passed to the engine binary.
    pub fn args(&self) -> Vec<String> {
        let owned = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        match self {
            EngineCall::ListRunning(name) => {
                let filter = format!("name={name}");
                owned(&["ps", "--filter", filter.as_str(), "--format", "{{.Names}}"])
            }
            EngineCall::ListAll(name) => {
                let filter = format!("name={name}");
                owned(&["ps", "-a", "--filter", filter.as_str(), "--format", "{{.Names}}"])
            }
            EngineCall::ListImages(name) => {
                let filter = format!("reference={name}");
                owned(&[
                    "images",
                    "--filter",
                    filter.as_str(),
                    "--format",
                    "{{.Repository}}:{{.Tag}}",
                ])
            }
            EngineCall::Start(name) => owned(&["start", name.as_str()]),
            EngineCall::Stop(name) => owned(&["stop", name.as_str()]),
            EngineCall::RemoveContainer(name) => owned(&["rm", name.as_str()]),
            EngineCall::RemoveImage(name) => owned(&["rmi", name.as_str()]),
            EngineCall::ComposeBuild => owned(&["compose", "build"]),
            EngineCall::ComposeUp => owned(&["compose", "up", "-d"]),
            EngineCall::AttachShell(name) => owned(&["exec", "-it", name.as_str(), "bash"]),
        }
    }
}

impl fmt::Display for EngineCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "docker {}", self.args().join(" "))
    }
}

/// `name` with an explicit tag; untagged names mean `:latest`.
///
/// Only the last path component is checked, so a registry port
/// (`localhost:5000/img`) is not mistaken for a tag.
pub fn image_reference(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name);
    if last.contains(':') || last.contains('@') {
        name.to_string()
    } else {
        format!("{name}:latest")
    }
}

/// Exit status and whatever output was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Whether any stdout line is exactly `name`.
    pub fn lists(&self, name: &str) -> bool {
        self.stdout.lines().any(|line| line.trim() == name)
    }

    /// Convert a non-zero status into [`Error::EngineCommandFailed`].
    pub fn check(self, call: &EngineCall) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::EngineCommandFailed {
                command: call.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

pub trait ContainerEngine {
    /// Run `call` to completion. `Err` means the engine could not be run at
    /// all; a non-zero exit is reported through [`EngineOutput::status`].
    fn run(&self, call: &EngineCall) -> Result<EngineOutput>;
}

/// The `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
    project_dir: PathBuf,
}

impl DockerCli {
    /// `program` is the engine binary; compose calls run in `project_dir`.
    pub fn new(program: PathBuf, project_dir: PathBuf) -> Self {
        Self {
            program,
            project_dir,
        }
    }

    fn command(&self, call: &EngineCall) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(call.args()).current_dir(&self.project_dir);
        cmd
    }

    fn unavailable(&self, e: io::Error) -> Error {
        Error::EngineUnavailable {
            reason: format!("running '{}': {e}", self.program.display()),
        }
    }
}

/// Exit code of a finished child; signals map to -1.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

impl ContainerEngine for DockerCli {
    fn run(&self, call: &EngineCall) -> Result<EngineOutput> {
        debug!(program = %self.program.display(), args = ?call.args(), "engine call");
        let mut cmd = self.command(call);

        match call.output_mode() {
            OutputMode::Captured => {
                let output = cmd
                    .stdin(Stdio::null())
                    .output()
                    .map_err(|e| self.unavailable(e))?;
                Ok(EngineOutput {
                    status: exit_code(output.status),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            OutputMode::Inherited => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(|e| self.unavailable(e))?;
                Ok(EngineOutput {
                    status: exit_code(status),
                    ..Default::default()
                })
            }
            OutputMode::Streamed => {
                let mut child = cmd
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit())
                    .spawn()
                    .map_err(|e| self.unavailable(e))?;

                let forwarded = match child.stdout.take() {
                    Some(stdout) => forward_lines(stdout),
                    None => Ok(()),
                };
                // Reap the child even if forwarding failed.
                let status = child.wait().map_err(|e| self.unavailable(e))?;
                forwarded.map_err(|e| self.unavailable(e))?;

                Ok(EngineOutput {
                    status: exit_code(status),
                    ..Default::default()
                })
            }
        }
    }
}

fn forward_lines(stream: impl io::Read) -> io::Result<()> {
    for line in BufReader::new(stream).lines() {
        println!("{}", line?.trim_end());
    }
    Ok(())
}
