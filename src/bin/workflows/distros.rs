use anyhow::{Context, Result};

use ros_env::distro::{self, HttpIndex};

pub(crate) fn list_distros() -> Result<()> {
    let index = HttpIndex::from_env();
    let distros = distro::list(&index)
        .with_context(|| format!("listing distributions from '{}'", index.url()))?;

    for summary in &distros {
        println!(
            "{:<12} {}  {}",
            summary.name,
            summary.generation,
            summary.status.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}
