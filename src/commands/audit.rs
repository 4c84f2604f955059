use anyhow::{Context, Result};

use fontbatch::audit;
use fontbatch::config::PipelineConfig;

/// Execute the `audit` command: print `path` for long files and
/// `path:line` for long lines.
pub fn execute(config: &PipelineConfig, limit: usize) -> Result<()> {
    let findings = audit::audit_siblings(config.root(), &config.sibling_prefix, limit)
        .with_context(|| format!("Failed to scan siblings of {}", config.root().display()))?;
    for finding in &findings {
        println!("{}", finding);
    }
    Ok(())
}
