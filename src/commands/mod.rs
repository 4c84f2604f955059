pub mod audit;
pub mod enumerate;
pub mod list;
pub mod render;
pub mod sample;
pub mod serialize;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use fontbatch::catalog::{Catalog, CatalogError};
use fontbatch::config::PipelineConfig;
use fontbatch::executor::{BatchExecutor, BatchReport};
use fontbatch::model::{BuildUnit, RenderResult};
use fontbatch::pipeline::UnitPipeline;
use fontbatch::sandbox::{ExternalTool, ProjectEnv};

/// Options for commands that run units through the worker pool.
pub struct RunOptions {
    pub keep: bool,
    pub report: Option<PathBuf>,
}

/// Loads the registry named by `config`.
pub fn load_catalog(config: &PipelineConfig) -> Result<Catalog> {
    let path = config.registry_path();
    match Catalog::load(&path) {
        Err(CatalogError::RegistryMissing(path)) => anyhow::bail!(
            "{} not found. Run `fontbatch enumerate` first.",
            path.display()
        ),
        other => other.with_context(|| format!("Failed to load registry: {}", path.display())),
    }
}

/// Builds the pipeline every unit runs through.
pub fn unit_pipeline(config: &PipelineConfig) -> UnitPipeline<ExternalTool> {
    UnitPipeline::new(
        ExternalTool::new(config.tool.clone()),
        ProjectEnv::from_config(config),
    )
    .with_retained_sandbox(config.retain_sandbox)
}

/// Runs `units` through the bounded pool and fails if any unit failed.
/// `rejected` holds units refused before submission.
pub async fn run_units(
    config: &PipelineConfig,
    units: Vec<BuildUnit>,
    skipped: usize,
    rejected: Vec<RenderResult>,
    opts: &RunOptions,
) -> Result<BatchReport> {
    let config = config.clone().with_retained_sandbox(opts.keep);
    let processor = Arc::new(unit_pipeline(&config));
    let report = BatchExecutor::new(config.workers)
        .run_all(processor, units)
        .await
        .with_skipped(skipped)
        .with_rejected(rejected);

    if let Some(path) = &opts.report {
        write_report(path, &report)?;
    }

    info!("Done. {}", report.summary());
    if !report.is_success() {
        let failed: Vec<&str> = report.failures().map(|r| r.unit.as_str()).collect();
        error!("Failed units: {}", failed.join(", "));
        anyhow::bail!("{} of {} units failed", failed.len(), report.total);
    }
    Ok(report)
}

fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Text lines to render: the file at `input` if it exists, else `input`
/// itself as one line, else stdin.
pub async fn read_lines(input: Option<&str>) -> Result<Vec<String>> {
    let content = match input {
        Some(input) if Path::new(input).exists() => tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read input file: {}", input))?,
        Some(input) => return Ok(vec![input.to_string()]),
        None => {
            if std::io::stdin().is_terminal() {
                eprintln!("Enter text to render (Ctrl-D to finish):");
            }
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };
    Ok(content.lines().map(str::to_string).collect())
}
