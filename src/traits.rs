use crate::model::{BuildUnit, RenderResult};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the external build-and-execute tool against a project directory.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Returns the program name this runner invokes (e.g., "moon").
    fn tool_id(&self) -> &str;

    /// Builds and runs `entry` inside `project_dir`, capturing both streams.
    ///
    /// Blocks until the process exits; no timeout is applied.
    async fn run(&self, project_dir: &Path, entry: &str) -> Result<ToolOutput, ToolError>;
}

/// Processes one unit end to end. Failures are reported in the result,
/// never propagated.
#[async_trait]
pub trait UnitProcessor: Send + Sync {
    async fn process(&self, unit: BuildUnit) -> RenderResult;
}
