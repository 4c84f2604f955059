use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use fontbatch::artifact::Compression;
use fontbatch::config::PipelineConfig;
use fontbatch::units::{claim_targets, select_units, skip_existing, Claimed, Pending, UnitRequest};

use super::{load_catalog, run_units, RunOptions};

pub struct Options {
    pub fonts: Vec<String>,
    pub outdir: PathBuf,
    pub limit: Option<usize>,
    pub force: bool,
    pub compression: Compression,
}

/// Execute the `serialize` command: one JSON artifact per registry package.
pub async fn execute(config: PipelineConfig, opts: Options, run: RunOptions) -> Result<()> {
    let catalog = load_catalog(&config)?;
    let request = UnitRequest::Serialize {
        names: opts.fonts,
        out_dir: opts.outdir.clone(),
        compression: opts.compression,
    };

    // Name filter, path claims, the idempotent filter, then the limit
    let Claimed { units, conflicts } = claim_targets(select_units(&catalog, &request)?);
    let Pending { mut units, skipped } = skip_existing(units, opts.force);
    if let Some(limit) = opts.limit {
        units.truncate(limit);
    }

    if units.is_empty() && conflicts.is_empty() {
        info!("No fonts to process.");
        return Ok(());
    }

    let report = run_units(&config, units, skipped, conflicts, &run).await?;
    info!(
        "Serialized {}/{} fonts into {}",
        report.succeeded(),
        report.total,
        opts.outdir.display()
    );
    Ok(())
}
