//! Persisting extracted payloads, with an optional in-place compression pass.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Zstd level used for artifact compression.
const ZSTD_LEVEL: i32 = 19;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compress {}: {reason}", path.display())]
    Compress { path: PathBuf, reason: String },
}

/// Post-processing applied to a written artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    /// `gzip -f` in place, producing `<name>.gz`
    Gzip,
    /// In-process zstd, producing `<name>.zst`
    Zstd,
}

impl Compression {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Zstd => Some("zst"),
        }
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            other => Err(format!("unknown codec '{other}' (expected gzip, zstd or none)")),
        }
    }
}

/// Destination of a unit's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactTarget {
    File {
        path: PathBuf,
        compression: Compression,
    },
    Stdout,
}

impl ArtifactTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ArtifactTarget::File {
            path: path.into(),
            compression: Compression::None,
        }
    }

    pub fn compressed(path: impl Into<PathBuf>, compression: Compression) -> Self {
        ArtifactTarget::File {
            path: path.into(),
            compression,
        }
    }

    /// Path of the file left on disk once writing finishes; `None` for stdout.
    pub fn final_path(&self) -> Option<PathBuf> {
        match self {
            ArtifactTarget::File { path, compression } => Some(match compression.extension() {
                Some(ext) => with_appended_extension(path, ext),
                None => path.clone(),
            }),
            ArtifactTarget::Stdout => None,
        }
    }
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Writes `payload` to `target`, returning the final on-disk path.
pub async fn write(target: &ArtifactTarget, payload: &str) -> Result<Option<PathBuf>, ArtifactError> {
    let (path, compression) = match target {
        ArtifactTarget::Stdout => {
            println!("{payload}");
            return Ok(None);
        }
        ArtifactTarget::File { path, compression } => (path, *compression),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, payload)
        .await
        .map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;

    match compression {
        Compression::None => {}
        Compression::Gzip => gzip_in_place(path).await?,
        Compression::Zstd => zstd_in_place(path.clone()).await?,
    }

    let written = target.final_path();
    debug!(path = ?written, "Artifact written");
    Ok(written)
}

async fn gzip_in_place(path: &Path) -> Result<(), ArtifactError> {
    let status = Command::new("gzip")
        .arg("-f")
        .arg(path)
        .status()
        .await
        .map_err(|e| ArtifactError::Compress {
            path: path.to_path_buf(),
            reason: format!("could not run gzip: {e}"),
        })?;
    if !status.success() {
        return Err(ArtifactError::Compress {
            path: path.to_path_buf(),
            reason: format!("gzip exited with {status}"),
        });
    }
    Ok(())
}

async fn zstd_in_place(path: PathBuf) -> Result<(), ArtifactError> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || -> Result<(), ArtifactError> {
        let io_err = |source| ArtifactError::Io {
            path: task_path.clone(),
            source,
        };
        let data = std::fs::read(&task_path).map_err(io_err)?;
        let packed = zstd::bulk::compress(&data, ZSTD_LEVEL).map_err(|e| ArtifactError::Compress {
            path: task_path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(with_appended_extension(&task_path, "zst"), packed).map_err(io_err)?;
        std::fs::remove_file(&task_path).map_err(io_err)?;
        Ok(())
    })
    .await
    .map_err(|e| ArtifactError::Compress {
        path,
        reason: format!("Task join error: {e}"),
    })?
}
