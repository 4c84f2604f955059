//! Maintenance scan for generated sources the toolchain cannot handle.

use serde::Serialize;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::discovery::sibling_repos;

/// Upper bound on lines per source file and characters per line.
pub const AUDIT_LIMIT: usize = 65_500;

const SOURCE_EXT: &str = "mbt";
const SKIPPED_DIRS: [&str; 2] = ["target", ".mooncakes"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Finding {
    LongFile { path: PathBuf, lines: usize },
    LongLine { path: PathBuf, line: usize, chars: usize },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::LongFile { path, .. } => write!(f, "{}", path.display()),
            Finding::LongLine { path, line, .. } => write!(f, "{}:{}", path.display(), line),
        }
    }
}

/// Audits every sibling repository of `root` matching `prefix`.
pub fn audit_siblings(root: &Path, prefix: &str, limit: usize) -> io::Result<Vec<Finding>> {
    let mut findings = Vec::new();
    for repo in sibling_repos(root, prefix)? {
        findings.extend(audit_tree(&repo, limit)?);
    }
    Ok(findings)
}

/// Walks `dir` and reports oversize `.mbt` files and lines.
///
/// Files that cannot be read as UTF-8 text are skipped.
pub fn audit_tree(dir: &Path, limit: usize) -> io::Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries: Vec<_> = fs::read_dir(&current)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();
            if entry.file_type()?.is_dir() {
                if !SKIPPED_DIRS.iter().any(|skip| name == *skip) {
                    stack.push(path);
                }
            } else if path.extension().is_some_and(|ext| ext == SOURCE_EXT) {
                match scan_file(&path, limit) {
                    Ok(found) => findings.extend(found),
                    Err(e) => debug!(path = %path.display(), "Skipping unreadable file: {}", e),
                }
            }
        }
    }
    Ok(findings)
}

fn scan_file(path: &Path, limit: usize) -> io::Result<Vec<Finding>> {
    let reader = BufReader::new(fs::File::open(path)?);
    let mut findings = Vec::new();
    let mut count = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        count = index + 1;
        let chars = line.chars().count();
        if chars > limit {
            findings.push(Finding::LongLine {
                path: path.to_path_buf(),
                line: count,
                chars,
            });
        }
    }
    if count > limit {
        findings.insert(
            0,
            Finding::LongFile {
                path: path.to_path_buf(),
                lines: count,
            },
        );
    }
    Ok(findings)
}
