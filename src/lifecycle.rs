//! Lifecycle of the generated container.
//!
//! Each command goes through three stages:
//!
//! 1. [`observe`] asks the engine for the container state. Nothing is cached.
//! 2. [`plan`] turns `(command, state)` into an ordered list of [`Step`]s.
//! 3. [`execute`] runs the steps and returns a [`Report`].
//!
//! A failed `MustSucceed` step skips the rest of the plan. A failed
//! `BestEffort` step is reported, and the next step still runs.

use std::fmt;

use tracing::{debug, warn};

use crate::engine::{image_reference, ContainerEngine, EngineCall, EngineOutput};
use crate::error::Result;

/// Which container and image a command acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub container: String,
    pub image: String,
}

/// State of the target container as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    StoppedExists,
    AbsentButImageExists,
    Absent,
}

impl LifecycleState {
    pub fn image_present(self) -> bool {
        !matches!(self, LifecycleState::Absent)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::StoppedExists => write!(f, "stopped"),
            LifecycleState::AbsentButImageExists => write!(f, "absent (image built)"),
            LifecycleState::Absent => write!(f, "absent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    Build,
    Start,
    Stop,
    Kill,
    Delete,
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleCommand::Build => write!(f, "build"),
            LifecycleCommand::Start => write!(f, "start"),
            LifecycleCommand::Stop => write!(f, "stop"),
            LifecycleCommand::Kill => write!(f, "kill"),
            LifecycleCommand::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    MustSucceed,
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub call: EngineCall,
    pub policy: Policy,
}

impl Step {
    fn must(call: EngineCall) -> Self {
        Self {
            call,
            policy: Policy::MustSucceed,
        }
    }

    fn best_effort(call: EngineCall) -> Self {
        Self {
            call,
            policy: Policy::BestEffort,
        }
    }

    /// Progress label printed before the step runs.
    pub fn label(&self) -> String {
        match &self.call {
            EngineCall::Start(name) => format!("starting container {name}"),
            EngineCall::Stop(name) => format!("stopping container {name}"),
            EngineCall::RemoveContainer(name) => format!("removing container {name}"),
            EngineCall::RemoveImage(name) => format!("removing image {name}"),
            EngineCall::ComposeBuild => "building image".to_string(),
            EngineCall::ComposeUp => "creating container".to_string(),
            EngineCall::AttachShell(name) => format!("attaching to {name}"),
            other => other.to_string(),
        }
    }
}

/// Ordered steps, plus a notice when there is nothing to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub notice: Option<&'static str>,
    pub steps: Vec<Step>,
}

impl Plan {
    fn steps(steps: Vec<Step>) -> Self {
        Self {
            notice: None,
            steps,
        }
    }

    fn notice(notice: &'static str) -> Self {
        Self {
            notice: Some(notice),
            steps: Vec::new(),
        }
    }
}

/// Query running containers, then all containers, then images.
///
/// Images are listed as `repository:tag` and matched against the target
/// image with its tag made explicit.
pub fn observe(engine: &dyn ContainerEngine, target: &Target) -> Result<LifecycleState> {
    let query = |call: EngineCall, name: &str| -> Result<bool> {
        let output = engine.run(&call)?.check(&call)?;
        Ok(output.lists(name))
    };

    let state = if query(
        EngineCall::ListRunning(target.container.clone()),
        &target.container,
    )? {
        LifecycleState::Running
    } else if query(EngineCall::ListAll(target.container.clone()), &target.container)? {
        LifecycleState::StoppedExists
    } else if query(
        EngineCall::ListImages(target.image.clone()),
        &image_reference(&target.image),
    )? {
        LifecycleState::AbsentButImageExists
    } else {
        LifecycleState::Absent
    };
    debug!(container = %target.container, %state, "observed state");
    Ok(state)
}

fn kill_steps(state: LifecycleState, container: &str) -> Vec<Step> {
    match state {
        LifecycleState::Running => vec![
            Step::best_effort(EngineCall::Stop(container.to_string())),
            Step::best_effort(EngineCall::RemoveContainer(container.to_string())),
        ],
        LifecycleState::StoppedExists => vec![Step::best_effort(EngineCall::RemoveContainer(
            container.to_string(),
        ))],
        LifecycleState::AbsentButImageExists | LifecycleState::Absent => Vec::new(),
    }
}

/// `build` needs no state query.
pub fn build_plan() -> Plan {
    Plan::steps(vec![Step::must(EngineCall::ComposeBuild)])
}

/// Decide which engine calls `command` needs from `state`.
pub fn plan(command: LifecycleCommand, state: LifecycleState, target: &Target) -> Plan {
    let container = target.container.as_str();
    let running = state == LifecycleState::Running;
    let exists = matches!(
        state,
        LifecycleState::Running | LifecycleState::StoppedExists
    );

    match command {
        LifecycleCommand::Build => build_plan(),
        LifecycleCommand::Start if running => Plan::notice("already running"),
        LifecycleCommand::Start if exists => Plan::steps(vec![
            Step::must(EngineCall::Start(container.to_string())),
            Step::best_effort(EngineCall::AttachShell(container.to_string())),
        ]),
        LifecycleCommand::Start => Plan::steps(vec![
            Step::must(EngineCall::ComposeUp),
            Step::best_effort(EngineCall::AttachShell(container.to_string())),
        ]),
        LifecycleCommand::Stop if running => {
            Plan::steps(vec![Step::best_effort(EngineCall::Stop(container.to_string()))])
        }
        LifecycleCommand::Stop => Plan::notice("already stopped"),
        LifecycleCommand::Kill if exists => Plan::steps(kill_steps(state, container)),
        LifecycleCommand::Kill => Plan::notice("already absent"),
        LifecycleCommand::Delete => {
            let mut steps = kill_steps(state, container);
            if state.image_present() {
                steps.push(Step::best_effort(EngineCall::RemoveImage(
                    target.image.clone(),
                )));
            }
            if steps.is_empty() {
                Plan::notice("already absent")
            } else {
                Plan::steps(steps)
            }
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed(EngineOutput),
    /// The engine could not be run for this step.
    Unavailable(String),
    /// Not run because an earlier must-succeed step failed.
    Skipped,
}

#[derive(Debug)]
pub struct StepResult {
    pub step: Step,
    pub outcome: Outcome,
}

impl StepResult {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, Outcome::Completed(output) if output.success())
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<StepResult>,
}

impl Report {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(StepResult::succeeded)
    }

    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.succeeded() && !matches!(r.outcome, Outcome::Skipped))
            .count()
    }

    pub fn summary(&self) -> String {
        let ok = self.results.iter().filter(|r| r.succeeded()).count();
        let skipped = self
            .results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Skipped))
            .count();
        format!(
            "{ok} succeeded, {} failed, {skipped} skipped",
            self.failures()
        )
    }
}

/// Observer for per-step progress, so console output stays out of the
/// controller.
pub trait Progress {
    fn before(&mut self, step: &Step);
    fn after(&mut self, result: &StepResult);
}

/// Run `steps` in order.
pub fn execute(
    engine: &dyn ContainerEngine,
    steps: Vec<Step>,
    progress: &mut dyn Progress,
) -> Report {
    let mut report = Report::default();
    let mut aborted = false;

    for step in steps {
        if aborted {
            report.results.push(StepResult {
                step,
                outcome: Outcome::Skipped,
            });
            continue;
        }

        progress.before(&step);
        let outcome = match engine.run(&step.call) {
            Ok(output) => Outcome::Completed(output),
            Err(e) => Outcome::Unavailable(e.to_string()),
        };
        let result = StepResult { step, outcome };
        progress.after(&result);

        if !result.succeeded() && result.step.policy == Policy::MustSucceed {
            warn!(call = %result.step.call, "required step failed; skipping the rest");
            aborted = true;
        }
        report.results.push(result);
    }

    report
}
