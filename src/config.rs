use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default module namespace of the pipeline's own drawing library.
pub const DEFAULT_NAMESPACE: &str = "gmlewis/fonts";

/// Default directory-name prefix of sibling font repositories.
pub const DEFAULT_SIBLING_PREFIX: &str = "mbt-fonts-";

pub const DEFAULT_REGISTRY: &str = "all-fonts.txt";
pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_BATCH_SIZE: usize = 221;

/// How the external build-and-run tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable name or path
    pub program: String,

    /// Value for `--target`; omitted from the command line when `None`
    pub target: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "moon".to_string(),
            target: Some("native".to_string()),
        }
    }
}

/// Settings shared by every pipeline command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root of the pipeline's own module; sibling repos live next to it
    pub root: PathBuf,

    /// Registry file; relative paths resolve against `root`
    pub registry: PathBuf,

    pub namespace: String,

    pub sibling_prefix: String,

    /// Worker pool width
    pub workers: usize,

    /// Fonts per grouped unit
    pub batch_size: usize,

    /// Leave sandbox directories on disk for debugging
    pub retain_sandbox: bool,

    pub tool: ToolConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            registry: PathBuf::from(DEFAULT_REGISTRY),
            namespace: DEFAULT_NAMESPACE.to_string(),
            sibling_prefix: DEFAULT_SIBLING_PREFIX.to_string(),
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            retain_sandbox: false,
            tool: ToolConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_registry(mut self, registry: impl Into<PathBuf>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Sets the worker pool width (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the grouped-unit size (at least one).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retained_sandbox(mut self, retain: bool) -> Self {
        self.retain_sandbox = retain;
        self
    }

    pub fn with_tool(mut self, tool: ToolConfig) -> Self {
        self.tool = tool;
        self
    }

    /// Registry path resolved against `root`.
    pub fn registry_path(&self) -> PathBuf {
        if self.registry.is_absolute() {
            self.registry.clone()
        } else {
            self.root.join(&self.registry)
        }
    }

    /// Owner segment of the namespace, e.g. `gmlewis`.
    pub fn owner(&self) -> &str {
        self.namespace
            .split('/')
            .next()
            .unwrap_or(&self.namespace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
