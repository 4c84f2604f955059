//! Dependency and package manifests for a generated project.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::model::{BuildUnit, TemplateKind};

/// File name of the generated dependency manifest.
pub const MODULE_MANIFEST: &str = "moon.mod.json";

/// File name of the generated package manifest.
pub const PACKAGE_MANIFEST: &str = "moon.pkg.json";

/// Filesystem facts every generated project needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEnv {
    /// Absolute root of the pipeline's own module
    pub root: PathBuf,

    /// Module name of the drawing library at `root`, e.g. `gmlewis/fonts`
    pub namespace: String,

    /// Sibling repo directory prefix, e.g. `mbt-fonts-`
    pub sibling_prefix: String,
}

impl ProjectEnv {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let root = config
            .root
            .canonicalize()
            .unwrap_or_else(|_| config.root.clone());
        Self {
            root,
            namespace: config.namespace.clone(),
            sibling_prefix: config.sibling_prefix.clone(),
        }
    }

    /// Physical directory of a package repo: the repo's suffix after its
    /// last hyphen names a sibling of `root`.
    ///
    /// `gmlewis/fonts-a` with root `/src/fonts` → `/src/mbt-fonts-a`.
    pub fn repo_location(&self, repo: &str) -> PathBuf {
        let suffix = repo.rsplit('-').next().unwrap_or(repo);
        let parent = self.root.parent().unwrap_or(&self.root);
        parent.join(format!("{}{}", self.sibling_prefix, suffix))
    }

    /// Library packages a template's program imports.
    fn capability_imports(&self, template: &TemplateKind) -> Vec<String> {
        match template {
            TemplateKind::Serialize => vec![self.namespace.clone()],
            TemplateKind::RenderLine { .. } | TemplateKind::RenderGrid { .. } => ["draw", "geom", "svg"]
                .iter()
                .map(|lib| format!("{}/{lib}", self.namespace))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDep {
    pub path: PathBuf,
}

/// `moon.mod.json`: module name plus local path dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    pub version: String,
    pub deps: BTreeMap<String, PathDep>,
}

/// `moon.pkg.json`: a main package and its imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(rename = "is-main")]
    pub is_main: bool,
    pub import: Vec<String>,
}

/// Maps the namespace to `root` and every referenced repo to its sibling.
pub fn module_manifest(unit: &BuildUnit, env: &ProjectEnv) -> ModuleManifest {
    let mut deps = BTreeMap::new();
    deps.insert(
        env.namespace.clone(),
        PathDep {
            path: env.root.clone(),
        },
    );
    for pkg in unit.referenced_packages() {
        deps.entry(pkg.repo().to_string()).or_insert_with(|| PathDep {
            path: env.repo_location(pkg.repo()),
        });
    }
    ModuleManifest {
        name: unit.template.project_name().to_string(),
        version: "0.1.0".to_string(),
        deps,
    }
}

/// Capability imports first, then every referenced package, deduplicated.
pub fn package_manifest(unit: &BuildUnit, env: &ProjectEnv) -> PackageManifest {
    let mut import = env.capability_imports(&unit.template);
    for pkg in unit.referenced_packages() {
        if !import.iter().any(|i| i == pkg.id()) {
            import.push(pkg.id().to_string());
        }
    }
    PackageManifest {
        is_main: true,
        import,
    }
}
