use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ros_env::config::DEFAULT_CONFIG_PATH;
use ros_env::lifecycle::LifecycleCommand;

mod workflows;

/// Generate and manage an isolated ROS environment in a Docker container.
#[derive(Parser)]
#[command(name = "ros-env", version, about)]
struct Cli {
    /// Saved configuration written by `create` and read by the other commands
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    param_path: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate Dockerfile, .env and docker-compose.yaml, and save the choices
    Create(CreateArgs),
    /// Regenerate the files from a saved configuration
    #[command(name = "create_from")]
    CreateFrom {
        /// Saved configuration to load
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Remove the generated files, the container and its image
    Delete,
    /// Build the image (run `create` first)
    Build,
    /// Start the container and attach a shell
    Start,
    /// Stop the container
    Stop,
    /// Stop and remove the container, keeping the image
    Kill,
    /// List the distributions known to the ROS index
    Distros,
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Container name (default: ros-<distro>)
    #[arg(short, long)]
    pub(crate) name: Option<String>,

    /// Image name (default: the container name)
    #[arg(long)]
    pub(crate) image_name: Option<String>,

    /// ROS distribution, e.g. humble, jazzy, noetic (default: humble)
    #[arg(long = "ros-version", visible_alias = "distro")]
    pub(crate) ros_version: Option<String>,

    /// Install the simulator packages for the distribution
    #[arg(short, long)]
    pub(crate) gazebo: bool,

    /// Folders to copy into, or share with, the container
    #[arg(short, long = "path", num_args = 1..)]
    pub(crate) paths: Vec<PathBuf>,

    /// Bind-mount the folders instead of copying them
    #[arg(short, long)]
    pub(crate) shared: bool,

    /// Extra environment variables, one KEY=value per line (.txt)
    #[arg(short, long)]
    pub(crate) env: Option<PathBuf>,

    /// Extra dependencies under #APT and #PIP markers (.txt)
    #[arg(short, long)]
    pub(crate) dependencies: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let param_path = cli.param_path.as_path();
    match cli.command {
        Command::Create(args) => workflows::create(&args, param_path),
        Command::CreateFrom { file } => workflows::create_from(&file, param_path),
        Command::Delete => workflows::delete(param_path),
        Command::Build => workflows::run_lifecycle(LifecycleCommand::Build, param_path),
        Command::Start => workflows::run_lifecycle(LifecycleCommand::Start, param_path),
        Command::Stop => workflows::run_lifecycle(LifecycleCommand::Stop, param_path),
        Command::Kill => workflows::run_lifecycle(LifecycleCommand::Kill, param_path),
        Command::Distros => workflows::list_distros(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_flags() {
        let cli = Cli::parse_from([
            "ros-env", "create", "--ros-version", "noetic", "-g", "-p", "src", "maps", "-s",
        ]);
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.ros_version.as_deref(), Some("noetic"));
                assert!(args.gazebo && args.shared);
                assert_eq!(args.paths, [PathBuf::from("src"), PathBuf::from("maps")]);
            }
            _ => panic!("expected create"),
        }
        assert_eq!(cli.param_path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_create_from_and_global_param_path() {
        let cli = Cli::parse_from([
            "ros-env",
            "create_from",
            "-f",
            "saved.yaml",
            "--param-path",
            "out.yaml",
        ]);
        assert!(matches!(
            cli.command,
            Command::CreateFrom { ref file } if file == &PathBuf::from("saved.yaml")
        ));
        assert_eq!(cli.param_path, PathBuf::from("out.yaml"));
    }
}
