use std::path::PathBuf;

use anyhow::Result;

use fontbatch::config::PipelineConfig;
use fontbatch::units::{select_units, UnitRequest};

use super::{load_catalog, read_lines, run_units, RunOptions};

pub struct Options {
    pub input: Option<String>,
    pub output: Option<PathBuf>,
    pub label_font: String,
    pub limit: Option<usize>,
    pub columns: usize,
}

/// Execute the `sample` command: grid sheets over the whole corpus.
pub async fn execute(config: PipelineConfig, opts: Options, run: RunOptions) -> Result<()> {
    let catalog = load_catalog(&config)?;
    if catalog.is_empty() {
        anyhow::bail!("No fonts found in {}", config.registry_path().display());
    }
    catalog.resolve_package(&opts.label_font)?;

    let request = UnitRequest::SampleGrid {
        label: opts.label_font,
        lines: read_lines(opts.input.as_deref()).await?,
        batch_size: config.batch_size,
        columns: opts.columns,
        limit: opts.limit,
        output: opts.output,
    };
    let units = select_units(&catalog, &request)?;

    run_units(&config, units, 0, Vec::new(), &run).await?;
    Ok(())
}
