//! Image build recipe (`Dockerfile`).

use crate::distro::Generation;
use crate::mounts::{Mount, DEFAULT_WORKSPACE};
use crate::options::GenerationOptions;

/// Packages every image gets, before the ROS-specific sets.
pub const BASELINE_SYSTEM_PACKAGES: &[&str] = &[
    "git",
    "make",
    "cmake",
    "build-essential",
    "python3",
    "python3-pip",
    "python3-rosdep",
    "libglib2.0-0",
    "libsm6",
    "libxext6",
    "libxrender-dev",
    "libopencv-dev",
    "ffmpeg",
    "xterm",
    "sudo",
];

pub const BASELINE_PYTHON_PACKAGES: &[&str] = &["networkx", "matplotlib", "xacro"];

pub const WORLD_GENERATOR_REPO: &str =
    "https://github.com/ali-pahlevani/Dynamic_World_Generator.git";
pub const WORLD_GENERATOR_DIR: &str = "/Dynamic_World_Generator";
const WIZARD: &str = "/Dynamic_World_Generator/code/dwg_wizard";

/// ros_control tooling, templated on distro and generation.
pub fn middleware_packages(distro: &str, generation: Generation) -> Vec<String> {
    let prefix = generation.package_prefix();
    vec![
        format!("ros-{distro}-{prefix}-control"),
        format!("ros-{distro}-{prefix}-controllers"),
        format!("ros-{distro}-joint-state-publisher"),
        format!("ros-{distro}-diagnostic-updater"),
        format!("ros-{distro}-pcl-ros"),
        format!("ros-{distro}-xacro"),
    ]
}

/// Gazebo bridge packages.
pub fn simulator_packages(distro: &str, generation: Generation) -> Vec<String> {
    match generation {
        Generation::GenTwo => vec![
            format!("ros-{distro}-ros-gz-sim"),
            format!("ros-{distro}-gz-ros2-control"),
            format!("ros-{distro}-ros-gz-bridge"),
            format!("ros-{distro}-ros-gz-image"),
        ],
        Generation::GenOne => vec![
            format!("ros-{distro}-gazebo-ros-pkgs"),
            format!("ros-{distro}-gazebo-ros-control"),
        ],
    }
}

/// Workspace folder created when nothing is mounted.
pub fn fallback_workspace(generation: Generation) -> String {
    match generation {
        Generation::GenOne => DEFAULT_WORKSPACE.to_string(),
        Generation::GenTwo => format!("{}_ws", generation.package_prefix()),
    }
}

/// JSON string literal, for the exec form of `COPY`.
fn json_string(value: &str) -> String {
    let mut out = String::from("\"");
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Default)]
struct Recipe {
    text: String,
}

impl Recipe {
    fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
        self
    }

    fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    /// `head` followed by one continued line per item, then `tail` if any.
    fn continued<I, S>(&mut self, head: &str, items: I, tail: Option<&str>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut body: Vec<String> = items
            .into_iter()
            .map(|item| format!("    {}", item.as_ref()))
            .collect();
        if let Some(tail) = tail {
            body.push(format!("    {tail}"));
        }
        self.text.push_str(head);
        for part in body {
            self.text.push_str(" \\\n");
            self.text.push_str(&part);
        }
        self.text.push('\n');
        self
    }
}

pub fn render(options: &GenerationOptions, mounts: &[Mount]) -> String {
    let distro = options.distro.as_str();
    let generation = options.generation;
    let extra = options.extra_dependencies.as_ref().map(|d| &d.lists);
    let world_generator = options.simulator && generation == Generation::GenTwo;

    let mut recipe = Recipe::default();
    recipe.line(format!("FROM osrf/ros:{distro}-desktop")).blank();

    let mut system: Vec<String> = BASELINE_SYSTEM_PACKAGES
        .iter()
        .map(|p| p.to_string())
        .collect();
    system.extend(middleware_packages(distro, generation));
    if options.simulator {
        system.extend(simulator_packages(distro, generation));
    }
    if let Some(extra) = extra {
        system.extend(extra.system.iter().cloned());
    }
    recipe
        .continued(
            "RUN apt-get update && apt-get install -y",
            &system,
            Some("&& rm -rf /var/lib/apt/lists/*"),
        )
        .blank();

    let python = BASELINE_PYTHON_PACKAGES
        .iter()
        .map(|p| p.to_string())
        .chain(extra.into_iter().flat_map(|e| e.language.iter().cloned()));
    recipe
        .line("ENV PIP_BREAK_SYSTEM_PACKAGES=1")
        .continued("RUN pip install --no-cache-dir", python, None)
        .blank();

    if world_generator {
        recipe
            .line("# Dynamic World Generator, for building Gazebo worlds")
            .line(format!(
                "RUN git clone {WORLD_GENERATOR_REPO} {WORLD_GENERATOR_DIR}"
            ))
            .line("RUN pip install --no-cache-dir PyQt5 lxml")
            .continued(
                &format!("RUN mv {WORLD_GENERATOR_DIR}/code/dwg_wizard.py {WIZARD}"),
                [format!("&& chmod +x {WIZARD}")],
                None,
            )
            .line(format!("ENV PATH=\"${{PATH}}:{WORLD_GENERATOR_DIR}/code\""))
            .blank();
    }

    recipe
        .line("# Non-root account mirroring the host user")
        .line("ARG UID")
        .line("ARG GID")
        .line("ARG USER")
        .line("ARG GROUP")
        .line("RUN groupadd -o -g ${GID} ${GROUP}")
        .line("RUN useradd -o -m -s /bin/bash -u ${UID} -g ${GID} ${USER}")
        .line("RUN echo \"${USER} ALL=(ALL) NOPASSWD:ALL\" >> /etc/sudoers")
        .line("RUN usermod -aG dialout,video ${USER}")
        .line("USER ${USER}")
        .blank();

    recipe.line(format!(
        "RUN echo 'source /opt/ros/{distro}/setup.bash' >> /home/${{USER}}/.bashrc"
    ));
    if world_generator {
        recipe.line(format!(
            "RUN echo 'export PATH=$PATH:{WORLD_GENERATOR_DIR}/code' >> /home/${{USER}}/.bashrc"
        ));
    }
    recipe.blank();

    if mounts.is_empty() {
        recipe
            .line("# Empty workspace")
            .line(format!(
                "RUN mkdir -p /home/${{USER}}/{}",
                fallback_workspace(generation)
            ));
    } else if options.share_mounts {
        recipe.line("# Workspace folders are bind-mounted at runtime");
    } else {
        recipe.line("# Workspace folders copied into the image");
        for mount in mounts {
            recipe.line(format!(
                "COPY --chown=${{USER}}:${{GROUP}} [{}, {}]",
                json_string(&mount.source.display().to_string()),
                json_string(&mount.target())
            ));
        }
    }
    recipe.line("WORKDIR /home/${USER}");

    recipe.text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ExtraDependencies;
    use std::path::PathBuf;

    fn options(generation: Generation) -> GenerationOptions {
        let distro = match generation {
            Generation::GenOne => "noetic",
            Generation::GenTwo => "humble",
        };
        GenerationOptions {
            container_name: format!("ros-{distro}"),
            image_name: format!("ros-{distro}"),
            distro: distro.to_string(),
            generation,
            simulator: false,
            mount_paths: Vec::new(),
            share_mounts: false,
            extra_env: None,
            extra_dependencies: None,
        }
    }

    fn mount(name: &str) -> Mount {
        Mount {
            source: PathBuf::from(format!("src/{name}")),
            host: PathBuf::from(format!("/work/src/{name}")),
            name: name.to_string(),
        }
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle)
            .unwrap_or_else(|| panic!("'{needle}' missing from:\n{text}"))
    }

    #[test]
    fn test_render_base_image_and_package_order() {
        let mut opts = options(Generation::GenTwo);
        opts.simulator = true;
        opts.extra_dependencies = Some(ExtraDependencies::parse("#APT\nlibserial-dev\n").unwrap());
        let text = render(&opts, &[]);

        assert!(text.starts_with("FROM osrf/ros:humble-desktop\n"));
        let baseline = position(&text, "    xterm \\");
        let control = position(&text, "ros-humble-ros2-control \\");
        let sim = position(&text, "ros-humble-ros-gz-sim \\");
        let extra = position(&text, "libserial-dev \\");
        let cleanup = position(&text, "&& rm -rf /var/lib/apt/lists/*");
        assert!(baseline < control && control < sim && sim < extra && extra < cleanup);
    }

    #[test]
    fn test_render_python_packages_continue_cleanly() {
        let mut opts = options(Generation::GenTwo);
        opts.extra_dependencies = Some(ExtraDependencies::parse("#PIP\npyserial\n").unwrap());
        let text = render(&opts, &[]);

        assert!(text.contains(concat!(
            "RUN pip install --no-cache-dir \\\n",
            "    networkx \\\n",
            "    matplotlib \\\n",
            "    xacro \\\n",
            "    pyserial\n"
        )));
    }

    #[test]
    fn test_render_ros1_uses_ros_prefix_and_gazebo_classic() {
        let mut opts = options(Generation::GenOne);
        opts.simulator = true;
        let text = render(&opts, &[]);

        assert!(text.contains("ros-noetic-ros-control \\"));
        assert!(text.contains("ros-noetic-gazebo-ros-pkgs \\"));
        assert!(!text.contains("Dynamic_World_Generator"));
        assert!(text.contains("RUN mkdir -p /home/${USER}/ros_ws\n"));
    }

    #[test]
    fn test_render_world_generator_only_for_ros2_simulation() {
        let mut opts = options(Generation::GenTwo);
        assert!(!render(&opts, &[]).contains(WORLD_GENERATOR_REPO));

        opts.simulator = true;
        let text = render(&opts, &[]);
        assert!(text.contains(&format!("RUN git clone {WORLD_GENERATOR_REPO}")));
        assert!(text.contains("export PATH=$PATH:/Dynamic_World_Generator/code"));
        assert!(position(&text, "git clone") < position(&text, "USER ${USER}"));
    }

    #[test]
    fn test_render_account_setup_precedes_bashrc() {
        let text = render(&options(Generation::GenTwo), &[]);
        let user = position(&text, "USER ${USER}\n");
        let sudo = position(&text, "NOPASSWD:ALL");
        let source = position(&text, "source /opt/ros/humble/setup.bash");
        assert!(sudo < user && user < source);
        assert!(text.contains("RUN usermod -aG dialout,video ${USER}"));
        assert!(text.ends_with("WORKDIR /home/${USER}\n"));
    }

    #[test]
    fn test_render_one_copy_step_per_mount() {
        let opts = options(Generation::GenTwo);
        let mounts = [mount("core_ws"), mount("drivers")];
        let text = render(&opts, &mounts);

        assert_eq!(text.matches("\nCOPY ").count(), 2);
        assert!(text.contains(
            "COPY --chown=${USER}:${GROUP} [\"src/core_ws\", \"/home/${USER}/core_ws\"]\n"
        ));
        assert!(!text.contains("mkdir -p"));
    }

    #[test]
    fn test_render_copy_keeps_spaces_in_one_argument() {
        let opts = options(Generation::GenTwo);
        let mounts = [Mount {
            source: PathBuf::from("my robot/ws \"a\""),
            host: PathBuf::from("/work/my robot/ws \"a\""),
            name: "ws \"a\"".into(),
        }];
        let text = render(&opts, &mounts);

        assert!(text.contains(
            r#"COPY --chown=${USER}:${GROUP} ["my robot/ws \"a\"", "/home/${USER}/ws \"a\""]"#
        ));
    }

    #[test]
    fn test_render_shared_mounts_are_not_copied() {
        let mut opts = options(Generation::GenTwo);
        opts.share_mounts = true;
        let text = render(&opts, &[mount("core_ws")]);

        assert!(!text.contains("COPY"));
        assert!(!text.contains("mkdir -p"));
    }

    #[test]
    fn test_fallback_workspace_per_generation() {
        assert_eq!(fallback_workspace(Generation::GenOne), "ros_ws");
        assert_eq!(fallback_workspace(Generation::GenTwo), "ros2_ws");
    }
}
