//! Building the working set of [`BuildUnit`]s and dropping finished ones.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::artifact::{ArtifactTarget, Compression};
use crate::catalog::{Catalog, CatalogError};
use crate::model::{Alignment, BuildUnit, OutputKind, Package, RenderResult, TemplateKind, UnitRole};

/// Sample text used when the grid tool receives no input.
pub const DEFAULT_SAMPLE: &str = "ABC abc 123";

/// Default base name for numbered sample sheets.
const DEFAULT_SHEET: &str = "sample.svg";

/// What a tool wants to process.
#[derive(Debug, Clone)]
pub enum UnitRequest {
    /// One serialize unit per registry package, optionally filtered by name.
    Serialize {
        names: Vec<String>,
        out_dir: PathBuf,
        compression: Compression,
    },

    /// One render-line unit for the family matching `query`.
    RenderFamily {
        query: String,
        lines: Vec<String>,
        output: OutputKind,
        align: Alignment,
        y_up: bool,
        target: ArtifactTarget,
    },

    /// The corpus (optionally truncated) split into sample-sheet batches.
    SampleGrid {
        label: String,
        lines: Vec<String>,
        batch_size: usize,
        columns: usize,
        limit: Option<usize>,
        output: Option<PathBuf>,
    },
}

/// Builds the units for `request`.
///
/// # Errors
///
/// [`CatalogError::FamilyNotFound`] / [`CatalogError::PackageNotFound`] when
/// a family or label-font query does not resolve.
pub fn select_units(catalog: &Catalog, request: &UnitRequest) -> Result<Vec<BuildUnit>, CatalogError> {
    match request {
        UnitRequest::Serialize {
            names,
            out_dir,
            compression,
        } => Ok(catalog
            .select_packages(names)
            .into_iter()
            .map(|pkg| serialize_unit(pkg, out_dir, *compression))
            .collect()),

        UnitRequest::RenderFamily {
            query,
            lines,
            output,
            align,
            y_up,
            target,
        } => {
            let (name, family) = catalog.resolve_family(query)?;
            let faces = family
                .faces()
                .ok_or_else(|| CatalogError::FamilyNotFound(query.clone()))?;
            Ok(vec![BuildUnit {
                name: name.to_string(),
                role: UnitRole::Single,
                packages: family.packages().cloned().collect(),
                batch: None,
                template: TemplateKind::RenderLine {
                    faces,
                    lines: lines.clone(),
                    output: *output,
                    align: *align,
                    y_up: *y_up,
                },
                target: target.clone(),
            }])
        }

        UnitRequest::SampleGrid {
            label,
            lines,
            batch_size,
            columns,
            limit,
            output,
        } => {
            let label = catalog.resolve_package(label)?.clone();
            let mut corpus = catalog.packages();
            if let Some(limit) = limit {
                corpus = &corpus[..(*limit).min(corpus.len())];
            }
            let lines = if lines.is_empty() {
                vec![DEFAULT_SAMPLE.to_string()]
            } else {
                lines.clone()
            };
            Ok(grid_units(corpus, *batch_size, &label, &lines, *columns, output.as_deref()))
        }
    }
}

fn serialize_unit(pkg: Package, out_dir: &Path, compression: Compression) -> BuildUnit {
    let path = out_dir.join(format!("{}.json", pkg.leaf()));
    BuildUnit {
        name: pkg.id().to_string(),
        role: UnitRole::Single,
        packages: vec![pkg],
        batch: None,
        template: TemplateKind::Serialize,
        target: ArtifactTarget::compressed(path, compression),
    }
}

/// Splits `corpus` into `ceil(len / batch_size)` grouped units.
pub fn grid_units(
    corpus: &[Package],
    batch_size: usize,
    label: &Package,
    lines: &[String],
    columns: usize,
    output: Option<&Path>,
) -> Vec<BuildUnit> {
    let chunks: Vec<&[Package]> = corpus.chunks(batch_size.max(1)).collect();
    let count = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| BuildUnit {
            name: format!("batch-{:03}", index + 1),
            role: UnitRole::Grouped,
            packages: chunk.to_vec(),
            batch: Some(index),
            template: TemplateKind::RenderGrid {
                label: label.clone(),
                lines: lines.to_vec(),
                columns,
            },
            target: sheet_target(output, index, count),
        })
        .collect()
}

/// Output for batch `index` of `count`: the given path for a single batch
/// (stdout if none), otherwise `<stem>-NNN<.ext>` numbered from 1.
pub fn sheet_target(output: Option<&Path>, index: usize, count: usize) -> ArtifactTarget {
    match (output, count) {
        (Some(path), 1) => ArtifactTarget::file(path),
        (None, 1) => ArtifactTarget::Stdout,
        (path, _) => ArtifactTarget::file(numbered(
            path.unwrap_or_else(|| Path::new(DEFAULT_SHEET)),
            index + 1,
        )),
    }
}

fn numbered(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{n:03}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n:03}"),
    };
    path.with_file_name(name)
}

/// Units with exclusive artifact paths.
#[derive(Debug)]
pub struct Claimed {
    pub units: Vec<BuildUnit>,

    /// Failed results for units whose path an earlier unit already owns
    pub conflicts: Vec<RenderResult>,
}

/// Gives each artifact path to the first unit that targets it.
///
/// A repeat of the same unit is dropped. A different unit aiming at a taken
/// path (e.g. the same leaf in two repos) becomes a failed result instead of
/// overwriting the earlier artifact. Stdout units are never in conflict.
pub fn claim_targets(units: Vec<BuildUnit>) -> Claimed {
    let mut owners: HashMap<PathBuf, String> = HashMap::new();
    let mut claimed = Vec::with_capacity(units.len());
    let mut conflicts = Vec::new();
    for unit in units {
        let Some(path) = unit.target.final_path() else {
            claimed.push(unit);
            continue;
        };
        match owners.get(&path) {
            Some(owner) if *owner == unit.name => {
                warn!("Ignoring duplicate registry entry: {}", unit.name);
            }
            Some(owner) => {
                let reason = format!(
                    "Artifact path {} already claimed by {}",
                    path.display(),
                    owner
                );
                warn!(unit = %unit.name, "{}", reason);
                conflicts.push(RenderResult::failed(unit.name, reason, 0));
            }
            None => {
                owners.insert(path, unit.name.clone());
                claimed.push(unit);
            }
        }
    }
    Claimed {
        units: claimed,
        conflicts,
    }
}

/// Units left after the idempotent filter.
#[derive(Debug)]
pub struct Pending {
    pub units: Vec<BuildUnit>,
    pub skipped: usize,
}

/// Drops units whose final artifact already exists, unless `force`.
/// Stdout units are never skipped.
pub fn skip_existing(units: Vec<BuildUnit>, force: bool) -> Pending {
    if force {
        return Pending { units, skipped: 0 };
    }
    let before = units.len();
    let units: Vec<BuildUnit> = units
        .into_iter()
        .filter(|unit| {
            !unit
                .target
                .final_path()
                .is_some_and(|path| path.exists())
        })
        .collect();
    let skipped = before - units.len();
    if skipped > 0 {
        info!(
            skipped,
            "Skipping {} units whose output already exists. Use --force to re-process.", skipped
        );
    }
    Pending { units, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(leaves: &[&str]) -> Catalog {
        Catalog::from_packages(
            leaves
                .iter()
                .map(|leaf| Package::parse(&format!("gmlewis/fonts-a/{leaf}")).unwrap()),
        )
    }

    fn grid_request(batch_size: usize, limit: Option<usize>, output: Option<PathBuf>) -> UnitRequest {
        UnitRequest::SampleGrid {
            label: "aileron_bold".into(),
            lines: vec![],
            batch_size,
            columns: 6,
            limit,
            output,
        }
    }

    #[test]
    fn test_serialize_units_paths() {
        let cat = catalog(&["abeezee_regular", "abeezee_italic"]);
        let units = select_units(
            &cat,
            &UnitRequest::Serialize {
                names: vec![],
                out_dir: PathBuf::from("all-fonts"),
                compression: Compression::Gzip,
            },
        )
        .unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name, "gmlewis/fonts-a/abeezee_regular");
        assert_eq!(
            units[1].target.final_path(),
            Some(PathBuf::from("all-fonts/abeezee_italic.json.gz"))
        );
        assert!(units.iter().all(|u| u.packages.len() == 1 && u.role == UnitRole::Single));
    }

    #[test]
    fn test_render_family_unit() {
        let cat = catalog(&["abeezee_regular", "abeezee_italic", "abeezee_bold", "bitter_regular"]);
        let units = select_units(
            &cat,
            &UnitRequest::RenderFamily {
                query: "abee".into(),
                lines: vec!["hi".into()],
                output: OutputKind::Json,
                align: Alignment::Left,
                y_up: true,
                target: ArtifactTarget::Stdout,
            },
        )
        .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "abeezee");
        assert_eq!(units[0].packages.len(), 3);
        match &units[0].template {
            TemplateKind::RenderLine { faces, .. } => {
                assert_eq!(faces.regular.leaf(), "abeezee_regular");
                assert_eq!(faces.bold.as_ref().unwrap().leaf(), "abeezee_bold");
            }
            other => panic!("unexpected template {other:?}"),
        }
    }

    #[test]
    fn test_render_family_not_found() {
        let cat = catalog(&["abeezee_regular"]);
        let err = select_units(
            &cat,
            &UnitRequest::RenderFamily {
                query: "zz".into(),
                lines: vec![],
                output: OutputKind::Svg,
                align: Alignment::Left,
                y_up: false,
                target: ArtifactTarget::Stdout,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::FamilyNotFound(q) if q == "zz"));
    }

    #[test]
    fn test_grid_batches_and_naming() {
        let leaves: Vec<String> = (0..7).map(|i| format!("f{i}_regular")).collect();
        let mut refs: Vec<&str> = leaves.iter().map(String::as_str).collect();
        refs.push("aileron_bold");
        let cat = catalog(&refs);

        let units = select_units(&cat, &grid_request(3, None, Some(PathBuf::from("out/sheet.svg")))).unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(units[2].packages.len(), 2);
        assert_eq!(units[0].target.final_path(), Some(PathBuf::from("out/sheet-001.svg")));
        assert_eq!(units[2].target.final_path(), Some(PathBuf::from("out/sheet-003.svg")));
        assert_eq!(units[1].batch, Some(1));
        assert!(matches!(
            &units[0].template,
            TemplateKind::RenderGrid { lines, .. } if lines == &vec![DEFAULT_SAMPLE.to_string()]
        ));
    }

    #[test]
    fn test_grid_single_batch_targets() {
        let cat = catalog(&["a_regular", "aileron_bold"]);
        let units = select_units(&cat, &grid_request(221, None, None)).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].target, ArtifactTarget::Stdout);

        let units = select_units(&cat, &grid_request(1, Some(1), None)).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].target, ArtifactTarget::Stdout);

        let units = select_units(&cat, &grid_request(1, None, None)).unwrap();
        assert_eq!(units[1].target.final_path(), Some(PathBuf::from("sample-002.svg")));
    }

    #[test]
    fn test_grid_missing_label_font() {
        let cat = catalog(&["a_regular"]);
        let err = select_units(&cat, &grid_request(10, None, None)).unwrap_err();
        assert!(matches!(err, CatalogError::PackageNotFound(_)));
    }

    #[test]
    fn test_claim_targets_rejects_shared_leaf() {
        let packages = [
            "gmlewis/fonts-a/bar_regular",
            "gmlewis/fonts-b/bar_regular",
            "gmlewis/fonts-a/bar_regular",
            "gmlewis/fonts-a/baz_regular",
        ]
        .map(|id| Package::parse(id).unwrap());
        let cat = Catalog::from_packages(packages);
        let request = UnitRequest::Serialize {
            names: vec![],
            out_dir: PathBuf::from("out"),
            compression: Compression::Gzip,
        };

        let claimed = claim_targets(select_units(&cat, &request).unwrap());
        let names: Vec<&str> = claimed.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["gmlewis/fonts-a/bar_regular", "gmlewis/fonts-a/baz_regular"]);

        assert_eq!(claimed.conflicts.len(), 1);
        let conflict = &claimed.conflicts[0];
        assert_eq!(conflict.unit, "gmlewis/fonts-b/bar_regular");
        assert!(!conflict.success);
        assert_eq!(
            conflict.error.as_deref(),
            Some("Artifact path out/bar_regular.json.gz already claimed by gmlewis/fonts-a/bar_regular")
        );
    }

    #[test]
    fn test_claim_targets_ignores_stdout_units() {
        let cat = catalog(&["a_regular", "aileron_bold"]);
        let units = select_units(&cat, &grid_request(221, None, None)).unwrap();
        let claimed = claim_targets(units);
        assert_eq!(claimed.units.len(), 1);
        assert!(claimed.conflicts.is_empty());
    }

    #[test]
    fn test_skip_existing() {
        let dir = tempfile::tempdir().unwrap();
        let cat = catalog(&["a_regular", "b_regular"]);
        let request = UnitRequest::Serialize {
            names: vec![],
            out_dir: dir.path().to_path_buf(),
            compression: Compression::Gzip,
        };
        std::fs::write(dir.path().join("a_regular.json.gz"), b"").unwrap();
        // uncompressed leftovers do not count as done
        std::fs::write(dir.path().join("b_regular.json"), b"").unwrap();

        let pending = skip_existing(select_units(&cat, &request).unwrap(), false);
        assert_eq!(pending.skipped, 1);
        assert_eq!(pending.units.len(), 1);
        assert_eq!(pending.units[0].packages[0].leaf(), "b_regular");

        let forced = skip_existing(select_units(&cat, &request).unwrap(), true);
        assert_eq!(forced.units.len(), 2);
        assert_eq!(forced.skipped, 0);
    }
}
