//! Registry file handling and regeneration from sibling font repositories.
//!
//! The registry is a newline-delimited list of package identifiers. It is
//! regenerated by scanning `<root>/../<prefix>*/<font>/moon.pkg.json`.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::CatalogError;
use crate::model::Package;

/// Marker file identifying a font package directory.
pub const PACKAGE_MARKER: &str = "moon.pkg.json";

/// Leading directory-name prefix dropped when deriving a repo name.
const REPO_DIR_PREFIX: &str = "mbt-";

/// Reads the registry at `path`.
///
/// # Errors
///
/// [`CatalogError::RegistryMissing`] when the file does not exist.
pub fn read_registry(path: &Path) -> Result<Vec<Package>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::RegistryMissing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(parse_registry(&content))
}

/// Parses registry content, skipping blank and malformed lines.
pub fn parse_registry(content: &str) -> Vec<Package> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match Package::parse(line) {
            Ok(pkg) => Some(pkg),
            Err(e) => {
                warn!("Skipping registry entry: {}", e);
                None
            }
        })
        .collect()
}

/// Sibling repository directories of `root` whose names start with `prefix`,
/// sorted by path. `root` must exist; relative roots such as `.` are
/// resolved against the working directory.
pub fn sibling_repos(root: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let root = root.canonicalize()?;
    let parent = root.parent().unwrap_or(&root);
    let mut repos = Vec::new();
    for entry in std::fs::read_dir(parent)? {
        let entry = entry?;
        let name = entry.file_name();
        if entry.file_type()?.is_dir() && name.to_string_lossy().starts_with(prefix) {
            repos.push(entry.path());
        }
    }
    repos.sort();
    Ok(repos)
}

/// Derives package identifiers for every font directory in the sibling
/// repositories, e.g. `../mbt-fonts-a/airstream` → `gmlewis/fonts-a/airstream`.
pub fn enumerate_packages(root: &Path, prefix: &str, owner: &str) -> std::io::Result<Vec<String>> {
    let mut found = Vec::new();
    for repo in sibling_repos(root, prefix)? {
        let repo_dir = repo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let repo_name = repo_dir
            .strip_prefix(REPO_DIR_PREFIX)
            .unwrap_or(&repo_dir)
            .to_string();

        let mut fonts = Vec::new();
        for entry in std::fs::read_dir(&repo)? {
            let entry = entry?;
            if entry.path().join(PACKAGE_MARKER).is_file() {
                fonts.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        fonts.sort();
        found.extend(
            fonts
                .into_iter()
                .map(|font| format!("{owner}/{repo_name}/{font}")),
        );
    }
    Ok(found)
}

/// Writes one identifier per line.
pub fn write_registry(path: &Path, ids: &[String]) -> std::io::Result<()> {
    let mut content = String::new();
    for id in ids {
        content.push_str(id);
        content.push('\n');
    }
    std::fs::write(path, content)?;
    info!(path = %path.display(), packages = ids.len(), "Registry written");
    Ok(())
}
