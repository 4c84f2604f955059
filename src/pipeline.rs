//! Per-unit render pipeline.
//!
//! This module provides [`UnitPipeline`], which takes one [`BuildUnit`]
//! through its stages (Sandbox → Tool → Extractor → ArtifactWriter) with:
//! - Async execution via `tokio`
//! - Structured logging via `tracing`
//! - Automatic cleanup of the sandbox via RAII (`Drop` on `ScopedProject`)
//! - Failure containment: every error stops at the unit boundary and is
//!   reported in a [`RenderResult`]

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::artifact::{self, ArtifactError};
use crate::extract::{self, ExtractError, ExtractMode};
use crate::model::{BuildUnit, OutputKind, RenderResult, TemplateKind};
use crate::sandbox::{ProjectEnv, Released, SandboxError, ScopedProject};
use crate::traits::{ToolError, ToolOutput, ToolRunner, UnitProcessor};

/// Output marker the grid program's runtime prints when a program aborts.
const FAILURE_MARKER: &str = "failed:";

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while processing one unit.
#[derive(thiserror::Error, Debug)]
pub enum UnitError {
    /// Descriptor generation or sandbox directory failure
    #[error("Sandbox setup failed: {0}")]
    Sandbox(#[from] SandboxError),

    /// The tool could not be started
    #[error(transparent)]
    Launch(#[from] ToolError),

    /// The tool ran but reported failure
    #[error("Tool run failed ({})", exit_label(.exit_code))]
    ToolFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// No payload in the tool's output
    #[error("{source}")]
    Extraction {
        source: ExtractError,
        stdout: String,
        stderr: String,
    },

    #[error("Artifact write failed: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Task join error: {0}")]
    Join(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl UnitError {
    fn tool_failed(output: ToolOutput) -> Self {
        UnitError::ToolFailed {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }

    /// Raw tool streams, when the failure happened after the tool ran.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            UnitError::ToolFailed { stdout, stderr, .. }
            | UnitError::Extraction { stdout, stderr, .. } => Some(format!(
                "--- STDOUT ---\n{}\n--- STDERR ---\n{}",
                stdout.trim_end(),
                stderr.trim_end()
            )),
            _ => None,
        }
    }

    /// Message plus diagnostics, as stored in a failed [`RenderResult`].
    pub fn detail(&self) -> String {
        match self.diagnostics() {
            Some(streams) => format!("{self}\n{streams}"),
            None => self.to_string(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Where the payload is found for each template.
pub fn extract_mode(template: &TemplateKind) -> ExtractMode {
    match template {
        TemplateKind::Serialize => ExtractMode::JsonSpan,
        TemplateKind::RenderLine {
            output: OutputKind::Json,
            ..
        } => ExtractMode::JsonLine,
        TemplateKind::RenderLine {
            output: OutputKind::Svg,
            ..
        }
        | TemplateKind::RenderGrid { .. } => ExtractMode::Svg,
    }
}

/// Successful unit outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    /// Final artifact path; `None` when written to stdout
    pub artifact: Option<PathBuf>,

    pub sandbox: Released,
}

/// Runs single units through sandbox, tool, extractor and writer.
///
/// The pipeline holds no per-unit state and is shared read-only by every
/// worker.
pub struct UnitPipeline<R>
where
    R: ToolRunner,
{
    runner: R,
    env: ProjectEnv,

    /// Keep sandbox directories for debugging
    retain_sandbox: bool,
}

impl<R> UnitPipeline<R>
where
    R: ToolRunner,
{
    pub fn new(runner: R, env: ProjectEnv) -> Self {
        Self {
            runner,
            env,
            retain_sandbox: false,
        }
    }

    pub fn with_retained_sandbox(mut self, retain: bool) -> Self {
        self.retain_sandbox = retain;
        self
    }

    /// Executes every stage for `unit`.
    ///
    /// The sandbox is released on every path: explicitly after a
    /// successful write, or by `Drop` when a stage returns early.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError`] if descriptor generation, the tool run,
    /// extraction, or the artifact write fails.
    pub async fn execute(&self, unit: &BuildUnit) -> Result<UnitOutcome, UnitError> {
        let project = {
            let unit = unit.clone();
            let env = self.env.clone();
            let retain = self.retain_sandbox;
            tokio::task::spawn_blocking(move || ScopedProject::acquire(&unit, &env, retain))
                .await
                .map_err(|e| UnitError::Join(e.to_string()))??
        };

        let output = self.runner.run(project.path(), project.entry()).await?;
        debug!(
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            "{} finished", self.runner.tool_id()
        );

        let grid = matches!(unit.template, TemplateKind::RenderGrid { .. });
        if !output.success() || (grid && output.stdout.contains(FAILURE_MARKER)) {
            return Err(UnitError::tool_failed(output));
        }

        let extracted = extract::extract(extract_mode(&unit.template), &output.stdout).map(str::to_string);
        let payload = match extracted {
            Ok(payload) => payload,
            Err(source) => {
                return Err(UnitError::Extraction {
                    source,
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
        };

        let artifact = artifact::write(&unit.target, &payload).await?;

        let sandbox = match project.release() {
            Ok(released) => released,
            Err(e) => {
                warn!("Failed to release sandbox: {}", e);
                Released::Removed
            }
        };
        Ok(UnitOutcome { artifact, sandbox })
    }
}

#[async_trait]
impl<R> UnitProcessor for UnitPipeline<R>
where
    R: ToolRunner,
{
    #[instrument(skip(self, unit), fields(unit = %unit.name))]
    async fn process(&self, unit: BuildUnit) -> RenderResult {
        let start = Instant::now();
        let result = self.execute(&unit).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(outcome) => RenderResult::succeeded(unit.name, outcome.artifact, duration_ms),
            Err(e) => RenderResult::failed(unit.name, e.detail(), duration_ms),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
