use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::artifact::ArtifactTarget;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid package identifier '{0}': expected org/repo/leaf-name")]
pub struct InvalidPackage(pub String);

/// A qualified font package identifier such as `gmlewis/fonts-a/abeezee_italic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Package {
    id: String,
}

impl Package {
    /// Parses an identifier with at least three non-empty `/` segments.
    pub fn parse(raw: &str) -> Result<Self, InvalidPackage> {
        let id = raw.trim();
        let segments: Vec<&str> = id.split('/').collect();
        if segments.len() < 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(InvalidPackage(raw.to_string()));
        }
        Ok(Self { id: id.to_string() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `org/repo` prefix, e.g. `gmlewis/fonts-a`.
    pub fn repo(&self) -> &str {
        let mut slashes = self.id.match_indices('/').map(|(i, _)| i);
        let _ = slashes.next();
        match slashes.next() {
            Some(end) => &self.id[..end],
            None => &self.id,
        }
    }

    /// The last path segment, which also serves as the import alias.
    pub fn leaf(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl TryFrom<String> for Package {
    type Error = InvalidPackage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Package::parse(&value)
    }
}

impl From<Package> for String {
    fn from(pkg: Package) -> Self {
        pkg.id
    }
}

/// Style axis of a package within its family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Regular,
    Italic,
    Bold,
    BoldItalic,
    Other(String),
}

impl Variant {
    /// Maps one of the four canonical tokens to its variant.
    pub fn from_canonical(token: &str) -> Option<Self> {
        match token {
            "regular" => Some(Variant::Regular),
            "italic" => Some(Variant::Italic),
            "bold" => Some(Variant::Bold),
            "bolditalic" => Some(Variant::BoldItalic),
            _ => None,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Variant::Regular => "regular",
            Variant::Italic => "italic",
            Variant::Bold => "bold",
            Variant::BoldItalic => "bolditalic",
            Variant::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitRole {
    /// One font (or one family) per unit.
    Single,
    /// A capped-size group of fonts rendered into one sample sheet.
    Grouped,
}

/// Payload kind emitted by the render-line template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Json,
    Svg,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Json => "json",
            OutputKind::Svg => "svg",
        }
    }

    /// y-axis orientation used when the caller does not pick one.
    pub fn default_y_up(&self) -> bool {
        matches!(self, OutputKind::Json)
    }
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputKind::Json),
            "svg" => Ok(OutputKind::Svg),
            other => Err(format!("unknown output kind '{other}' (expected json or svg)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(format!(
                "unknown alignment '{other}' (expected left, center or right)"
            )),
        }
    }
}

/// The faces a render-line program draws with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSet {
    pub regular: Package,
    pub bold: Option<Package>,
    pub italic: Option<Package>,
}

/// Which entry program the sandbox generates, with its per-template options.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateKind {
    /// Load one font and print its structured representation as JSON.
    Serialize,

    /// Lay out text lines with up to three faces of one family.
    RenderLine {
        faces: FaceSet,
        lines: Vec<String>,
        output: OutputKind,
        align: Alignment,
        y_up: bool,
    },

    /// Tile every font of the unit into a labeled SVG sample sheet.
    RenderGrid {
        label: Package,
        lines: Vec<String>,
        columns: usize,
    },
}

impl TemplateKind {
    /// Module name written into the generated dependency manifest.
    pub fn project_name(&self) -> &'static str {
        match self {
            TemplateKind::Serialize => "temp-compress",
            TemplateKind::RenderLine { .. } => "temp-render",
            TemplateKind::RenderGrid { .. } => "temp-sample-all",
        }
    }
}

/// The atomic item of work submitted to the scheduler.
#[derive(Debug, Clone)]
pub struct BuildUnit {
    /// Human-readable identity used in progress and reports
    pub name: String,

    pub role: UnitRole,

    /// Packages imported by the generated program, never empty
    pub packages: Vec<Package>,

    /// Zero-based batch index for grouped units
    pub batch: Option<usize>,

    pub template: TemplateKind,

    /// Where the extracted payload lands
    pub target: ArtifactTarget,
}

impl BuildUnit {
    /// Every package the sandbox must resolve, including the label font of a grid.
    pub fn referenced_packages(&self) -> Vec<&Package> {
        let mut all: Vec<&Package> = self.packages.iter().collect();
        if let TemplateKind::RenderGrid { label, .. } = &self.template {
            if !all.contains(&label) {
                all.push(label);
            }
        }
        all
    }
}

/// Outcome of processing one [`BuildUnit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    pub unit: String,
    pub success: bool,
    pub artifact: Option<PathBuf>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl RenderResult {
    pub fn succeeded(unit: impl Into<String>, artifact: Option<PathBuf>, duration_ms: u64) -> Self {
        Self {
            unit: unit.into(),
            success: true,
            artifact,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(unit: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            unit: unit.into(),
            success: false,
            artifact: None,
            error: Some(error.into()),
            duration_ms,
        }
    }
}
