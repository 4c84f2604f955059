//! Throwaway compilation project for one build unit.
//!
//! # RAII Cleanup
//!
//! [`ScopedProject`] owns its temporary directory and removes it on
//! [`Drop`], so every exit path (tool failure, extraction failure, an early
//! `?` return, a panic) cleans up. When retention is requested the
//! directory is left in place and its path is logged instead. The type is
//! deliberately not `Clone`.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::manifest::{self, ProjectEnv, MODULE_MANIFEST, PACKAGE_MANIFEST};
use super::templates::{self, ENTRY_FILE};
use crate::model::BuildUnit;

const DIR_PREFIX: &str = "fontbatch-";

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Sandbox I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// How a project directory was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Released {
    Removed,
    Retained(PathBuf),
}

/// A uniquely named project directory holding the three generated
/// descriptors for one unit.
#[derive(Debug)]
pub struct ScopedProject {
    dir: Option<TempDir>,
    path: PathBuf,
    retain: bool,
}

impl ScopedProject {
    /// Creates the directory and writes the dependency manifest, package
    /// manifest and entry program for `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] if the directory or a descriptor cannot be
    /// written. The partially written directory is released before returning.
    pub fn acquire(unit: &BuildUnit, env: &ProjectEnv, retain: bool) -> Result<Self, SandboxError> {
        let dir = tempfile::Builder::new().prefix(DIR_PREFIX).tempdir()?;
        let project = Self {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
            retain,
        };

        let module = manifest::module_manifest(unit, env);
        let package = manifest::package_manifest(unit, env);
        std::fs::write(
            project.path.join(MODULE_MANIFEST),
            serde_json::to_string_pretty(&module)?,
        )?;
        std::fs::write(
            project.path.join(PACKAGE_MANIFEST),
            serde_json::to_string_pretty(&package)?,
        )?;
        std::fs::write(project.path.join(ENTRY_FILE), templates::entry_program(unit))?;

        debug!(unit = %unit.name, path = %project.path.display(), "Sandbox ready");
        Ok(project)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self) -> &'static str {
        ENTRY_FILE
    }

    /// Releases the directory now, surfacing removal errors that `Drop`
    /// can only log.
    pub fn release(mut self) -> Result<Released, SandboxError> {
        match self.dir.take() {
            Some(dir) if self.retain => Ok(Released::Retained(keep(dir))),
            Some(dir) => {
                dir.close()?;
                Ok(Released::Removed)
            }
            None => Ok(Released::Removed),
        }
    }
}

impl Drop for ScopedProject {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if self.retain {
            keep(dir);
        } else if let Err(e) = dir.close() {
            warn!(path = %self.path.display(), "Failed to remove sandbox: {}", e);
        }
    }
}

fn keep(dir: TempDir) -> PathBuf {
    #[allow(deprecated)]
    let path = dir.into_path();
    info!("Project kept at: {}", path.display());
    path
}
