use std::path::Path;

use anyhow::{Context, Result};

use fontbatch::config::PipelineConfig;
use fontbatch::discovery;

/// Execute the `enumerate` command: rebuild the registry from sibling repos.
pub fn execute(config: &PipelineConfig, output: Option<&Path>) -> Result<()> {
    let ids = discovery::enumerate_packages(config.root(), &config.sibling_prefix, config.owner())
        .with_context(|| format!("Failed to scan siblings of {}", config.root().display()))?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.registry_path());
    discovery::write_registry(&path, &ids)
        .with_context(|| format!("Failed to write registry: {}", path.display()))?;
    println!("Found {} fonts. Written to {}", ids.len(), path.display());
    Ok(())
}
