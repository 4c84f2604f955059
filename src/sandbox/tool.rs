//! The real external build-and-run tool.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::config::ToolConfig;
use crate::traits::{ToolError, ToolOutput, ToolRunner};

/// Invokes `<program> run <entry> [--target <target>]` in the project directory.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    config: ToolConfig,
}

impl ExternalTool {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    fn args(&self, entry: &str) -> Vec<String> {
        let mut args = vec!["run".to_string(), entry.to_string()];
        if let Some(target) = &self.config.target {
            args.push("--target".to_string());
            args.push(target.clone());
        }
        args
    }
}

#[async_trait]
impl ToolRunner for ExternalTool {
    fn tool_id(&self) -> &str {
        &self.config.program
    }

    async fn run(&self, project_dir: &Path, entry: &str) -> Result<ToolOutput, ToolError> {
        let args = self.args(entry);
        debug!(
            program = %self.config.program,
            args = ?args,
            cwd = %project_dir.display(),
            "Running external tool"
        );

        let output = Command::new(&self.config.program)
            .args(&args)
            .current_dir(project_dir)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_with_and_without_target() {
        let tool = ExternalTool::new(ToolConfig::default());
        assert_eq!(tool.args("main.mbt"), vec!["run", "main.mbt", "--target", "native"]);

        let tool = ExternalTool::new(ToolConfig {
            program: "moon".into(),
            target: None,
        });
        assert_eq!(tool.args("main.mbt"), vec!["run", "main.mbt"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let tool = ExternalTool::new(ToolConfig {
            program: "fontbatch-no-such-tool".into(),
            target: None,
        });
        let dir = tempfile::tempdir().unwrap();
        let err = tool.run(dir.path(), "main.mbt").await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_streams_and_exit_code() {
        // `sh run main.mbt` executes the `run` script in the project directory
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("run"),
            "echo 'Using cached deps'\necho \"{\\\"entry\\\":\\\"$1\\\"}\"\necho oops >&2\nexit 3\n",
        )
        .unwrap();
        let tool = ExternalTool::new(ToolConfig {
            program: "sh".into(),
            target: None,
        });

        let out = tool.run(dir.path(), "main.mbt").await.unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
        assert!(out.stdout.contains("{\"entry\":\"main.mbt\"}"));
        assert_eq!(out.stderr.trim(), "oops");
    }
}
