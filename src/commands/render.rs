use std::path::PathBuf;

use anyhow::Result;

use fontbatch::artifact::ArtifactTarget;
use fontbatch::config::PipelineConfig;
use fontbatch::model::{Alignment, OutputKind};
use fontbatch::units::{select_units, UnitRequest};

use super::{load_catalog, read_lines, unit_pipeline};

pub struct Options {
    pub input: Option<String>,
    pub font: String,
    pub output: Option<PathBuf>,
    pub format: OutputKind,
    pub align: Alignment,
    pub y_up: bool,
}

/// Execute the `render` command: lay out text in one family.
pub async fn execute(config: PipelineConfig, opts: Options) -> Result<()> {
    let catalog = load_catalog(&config)?;
    catalog.resolve_family(&opts.font)?;

    let lines = read_lines(opts.input.as_deref()).await?;
    if lines.is_empty() {
        eprintln!("No input text provided.");
        return Ok(());
    }

    let request = UnitRequest::RenderFamily {
        query: opts.font,
        lines,
        output: opts.format,
        align: opts.align,
        y_up: opts.y_up,
        target: opts
            .output
            .map(ArtifactTarget::file)
            .unwrap_or(ArtifactTarget::Stdout),
    };

    // A single unit runs inline; its diagnostics surface as the error
    for unit in select_units(&catalog, &request)? {
        unit_pipeline(&config)
            .execute(&unit)
            .await
            .map_err(|e| anyhow::anyhow!(e.detail()))?;
    }
    Ok(())
}
