use anyhow::{Context, Result};
use std::path::Path;

use ros_env::config;
use ros_env::distro::{HttpIndex, DEFAULT_DISTRO};
use ros_env::generator::{self, files};
use ros_env::identity::HostIdentity;
use ros_env::options::{self, GenerationOptions, Request};

use crate::CreateArgs;

fn request_from(args: &CreateArgs) -> Request {
    Request {
        container_name: args.name.clone(),
        image_name: args.image_name.clone(),
        distro: args.ros_version.clone(),
        simulator: args.gazebo,
        mount_paths: args.paths.clone(),
        share_mounts: args.shared,
        env_file: args.env.clone(),
        dependencies_file: args.dependencies.clone(),
    }
}

fn print_summary(request: &Request) {
    let or_default = |value: Option<&Path>| {
        value
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    };
    println!(
        "[create] ROS {} with the following options:",
        request.distro.as_deref().unwrap_or(DEFAULT_DISTRO)
    );
    println!(
        "  container name: {}",
        request.container_name.as_deref().unwrap_or("(default)")
    );
    println!("  simulator:      {}", request.simulator);
    let folders = if request.mount_paths.is_empty() {
        "(default workspace)".to_string()
    } else {
        request
            .mount_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mode = if request.share_mounts { "shared" } else { "copied" };
    println!("  folders ({mode}): {folders}");
    println!("  environment:    {}", or_default(request.env_file.as_deref()));
    println!(
        "  dependencies:   {}",
        or_default(request.dependencies_file.as_deref())
    );
}

pub(crate) fn create(args: &CreateArgs, param_path: &Path) -> Result<()> {
    let project_dir = super::project_dir()?;
    let request = request_from(args);
    print_summary(&request);

    let index = HttpIndex::from_env();
    let options = options::prepare(&request, &index, &project_dir)
        .context("resolving create options")?;
    generate_and_save("create", &options, &project_dir, param_path)
}

pub(crate) fn create_from(file: &Path, param_path: &Path) -> Result<()> {
    let project_dir = super::project_dir()?;
    println!("[create_from] loading {}", file.display());

    let document = config::load_document(file)
        .with_context(|| format!("loading saved configuration '{}'", file.display()))?;
    let distro = document.ros.distro.clone();

    let index = HttpIndex::from_env();
    let options = options::from_saved(document, &index)
        .with_context(|| format!("rebuilding options for saved distro '{distro}'"))?;
    generate_and_save("create_from", &options, &project_dir, param_path)
}

fn generate_and_save(
    tag: &str,
    options: &GenerationOptions,
    project_dir: &Path,
    param_path: &Path,
) -> Result<()> {
    let identity = HostIdentity::capture();
    let artifacts = generator::generate(options, &identity, project_dir)
        .context("rendering environment files")?;

    let written = files::write_artifacts(project_dir, &artifacts)
        .with_context(|| format!("writing environment files to '{}'", project_dir.display()))?;
    for path in &written {
        println!("[{tag}] wrote {}", path.display());
    }

    let saved = project_dir.join(param_path);
    config::save(&saved, options)
        .with_context(|| format!("saving configuration to '{}'", saved.display()))?;
    println!("[{tag}] saved configuration to {}", saved.display());
    println!(
        "[{tag}] environment '{}' ready; run `ros-env build` next",
        options.container_name
    );
    Ok(())
}
