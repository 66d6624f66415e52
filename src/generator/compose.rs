//! Compose descriptor (`docker-compose.yaml`).

use super::{DOCKERFILE_NAME, ENV_FILE_NAME};
use crate::mounts::Mount;
use crate::options::GenerationOptions;

/// Service key; fixed so lifecycle commands never depend on it.
pub const SERVICE_NAME: &str = "ros_env";

pub const X11_VOLUME: &str = "/tmp/.X11-unix:/tmp/.X11-unix";

const BUILD_ARGS: &[&str] = &["UID", "GID", "USER", "GROUP"];

/// Body of a double-quoted YAML scalar, with `$` doubled so compose does
/// not interpolate it.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("$$"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

/// `container_name` is the options' container name, which is the name the
/// lifecycle queries look for.
pub fn render(options: &GenerationOptions, mounts: &[Mount]) -> String {
    let mut out = String::from("services:\n");
    out.push_str(&format!("  {SERVICE_NAME}:\n"));
    out.push_str(&format!(
        "    container_name: {}\n",
        quoted(&options.container_name)
    ));
    out.push_str(&format!("    image: {}\n", quoted(&options.image_name)));
    out.push_str("    build:\n");
    out.push_str("      context: .\n");
    out.push_str(&format!("      dockerfile: {DOCKERFILE_NAME}\n"));
    out.push_str("      args:\n");
    for arg in BUILD_ARGS {
        out.push_str(&format!("        {arg}: ${{{arg}}}\n"));
    }
    out.push_str("    env_file:\n");
    out.push_str(&format!("      - {ENV_FILE_NAME}\n"));
    out.push_str("    volumes:\n");
    out.push_str(&format!("      - {X11_VOLUME}\n"));
    if options.share_mounts {
        for mount in mounts {
            // The target keeps `${USER}` for compose to expand.
            out.push_str(&format!(
                "      - \"{}:/home/${{USER}}/{}\"\n",
                escape(&mount.host.display().to_string()),
                escape(&mount.name)
            ));
        }
    }
    out.push_str("    stdin_open: true\n");
    out.push_str("    tty: true\n");
    out
}
