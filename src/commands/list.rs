use anyhow::Result;

use fontbatch::config::PipelineConfig;

use super::load_catalog;

/// Execute the `list` command: one `family (variants)` line per family.
pub fn execute(config: &PipelineConfig) -> Result<()> {
    let catalog = load_catalog(config)?;
    for line in catalog.listing() {
        println!("{}", line);
    }
    Ok(())
}
