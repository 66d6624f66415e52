use anyhow::{Context, Result};
use std::path::Path;

use ros_env::config;
use ros_env::engine::DockerCli;
use ros_env::generator::files::{self, Removal};
use ros_env::lifecycle::{
    self, LifecycleCommand, Outcome, Plan, Progress, Step, StepResult, Target,
};
use ros_env::preflight;

/// Prints one status line per step under a `[command:container]` tag.
struct Console {
    tag: String,
}

impl Progress for Console {
    fn before(&mut self, step: &Step) {
        println!("[{}] {}...", self.tag, step.label());
    }

    fn after(&mut self, result: &StepResult) {
        let label = result.step.label();
        match &result.outcome {
            Outcome::Completed(output) if output.success() => {
                println!("[{}] {} done", self.tag, label);
            }
            Outcome::Completed(output) => {
                println!("[{}] {} failed (exit {})", self.tag, label, output.status);
                let stderr = output.stderr.trim();
                if !stderr.is_empty() {
                    println!("  {}", stderr);
                }
            }
            Outcome::Unavailable(reason) => {
                println!("[{}] {} failed: {}", self.tag, label, reason);
            }
            Outcome::Skipped => {}
        }
    }
}

fn load_target(param_path: &Path) -> Result<Target> {
    let options = config::load(param_path).with_context(|| {
        format!("loading saved configuration '{}'", param_path.display())
    })?;
    Ok(Target {
        container: options.container_name,
        image: options.image_name,
    })
}

fn engine(project_dir: &Path) -> Result<DockerCli> {
    let program = preflight::engine_program().context("locating container engine")?;
    Ok(DockerCli::new(program, project_dir.to_path_buf()))
}

fn run_plan(engine: &DockerCli, tag: String, plan: Plan) {
    if let Some(notice) = plan.notice {
        println!("[{tag}] {notice}");
    }
    if plan.steps.is_empty() {
        return;
    }

    let mut console = Console { tag };
    let report = lifecycle::execute(engine, plan.steps, &mut console);
    for skipped in report
        .results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Skipped))
    {
        println!("[{}] {} skipped", console.tag, skipped.step.label());
    }
    if report.all_succeeded() {
        println!("[{}] done: {}", console.tag, report.summary());
    } else {
        println!("[{}] finished with failures: {}", console.tag, report.summary());
    }
}

fn observe_and_run(
    command: LifecycleCommand,
    target: &Target,
    project_dir: &Path,
) -> Result<()> {
    let engine = engine(project_dir)?;
    let state = lifecycle::observe(&engine, target)
        .with_context(|| format!("querying state of '{}'", target.container))?;
    let tag = format!("{command}:{}", target.container);
    println!("[{tag}] container is {state}");
    run_plan(&engine, tag, lifecycle::plan(command, state, target));
    Ok(())
}

pub(crate) fn run_lifecycle(command: LifecycleCommand, param_path: &Path) -> Result<()> {
    let project_dir = super::project_dir()?;
    if command == LifecycleCommand::Build {
        let engine = engine(&project_dir)?;
        run_plan(&engine, command.to_string(), lifecycle::build_plan());
        return Ok(());
    }

    let target = load_target(&project_dir.join(param_path))?;
    observe_and_run(command, &target, &project_dir)
}

pub(crate) fn delete(param_path: &Path) -> Result<()> {
    let project_dir = super::project_dir()?;
    let target = load_target(&project_dir.join(param_path))?;

    println!("[delete] removing generated files...");
    for removal in files::remove_artifacts(&project_dir) {
        match removal {
            Removal::Removed(path) => println!("[delete] {} deleted", path.display()),
            Removal::Missing(_) => {}
            Removal::Failed(path, e) => {
                println!("[delete] could not remove {}: {}", path.display(), e)
            }
        }
    }

    observe_and_run(LifecycleCommand::Delete, &target, &project_dir)
}
