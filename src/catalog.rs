//! Font catalog: family/variant classification of the package registry.
//!
//! Every package is classified from its leaf name into a `(family, variant)`
//! pair. Each family keeps exactly one canonical package per variant slot,
//! chosen by the registration tie-break in [`Family`]. Families are kept in
//! first-seen registry order, which fuzzy family resolution depends on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::discovery;
use crate::model::{FaceSet, Package, Variant};

/// Separator between family and variant in a leaf name.
pub const DELIMITER: char = '_';

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    /// The registry file does not exist; nothing can be scheduled
    #[error("Registry file not found: {}. Run `fontbatch enumerate` first.", .0.display())]
    RegistryMissing(PathBuf),

    #[error("Failed to read registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find font family matching '{0}'")]
    FamilyNotFound(String),

    #[error("Could not find font package matching '{0}'")]
    PackageNotFound(String),
}

// ============================================================================
// Classification
// ============================================================================

/// Classifies a leaf name into `(family, variant)`.
///
/// Delimited names split on the last `_`. Undelimited names keep the whole
/// name as the family and scan it (lower-cased) for variant tokens.
pub fn classify(leaf: &str) -> (String, Variant) {
    match leaf.rsplit_once(DELIMITER) {
        Some((family, raw)) => {
            let variant = Variant::from_canonical(raw).unwrap_or_else(|| scan_raw_variant(raw));
            (family.to_string(), variant)
        }
        None => {
            let lower = leaf.to_lowercase();
            let variant = if lower.contains("bolditalic") {
                Variant::BoldItalic
            } else if lower.contains("bold") {
                Variant::Bold
            } else if lower.contains("italic") {
                Variant::Italic
            } else {
                Variant::Regular
            };
            (leaf.to_string(), variant)
        }
    }
}

fn scan_raw_variant(raw: &str) -> Variant {
    let bold = raw.contains("bold");
    let italic = raw.contains("italic");
    match (bold, italic) {
        (true, true) => Variant::BoldItalic,
        (true, false) => Variant::Bold,
        (false, true) => Variant::Italic,
        (false, false) => Variant::Other(raw.to_string()),
    }
}

fn has_delimited_token(leaf: &str, variant: &Variant) -> bool {
    leaf.contains(&format!("{DELIMITER}{}", variant.token()))
}

// ============================================================================
// Family
// ============================================================================

/// Variant slots of one family, in first-registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Family {
    slots: Vec<(Variant, Package)>,
}

impl Family {
    pub fn get(&self, variant: &Variant) -> Option<&Package> {
        self.slots
            .iter()
            .find(|(v, _)| v == variant)
            .map(|(_, pkg)| pkg)
    }

    pub fn variants(&self) -> impl Iterator<Item = &Variant> {
        self.slots.iter().map(|(v, _)| v)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.slots.iter().map(|(_, pkg)| pkg)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registers `pkg` under `variant`, returning whether the slot changed.
    ///
    /// A later package takes an occupied slot when the slot is `Regular`
    /// (last regular wins), or when it carries the `_<variant>` token for
    /// bold/italic/bolditalic and the current holder does not.
    fn register(&mut self, variant: Variant, pkg: Package) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|(v, _)| *v == variant) else {
            self.slots.push((variant, pkg));
            return true;
        };

        let replace = match &variant {
            Variant::Regular => true,
            Variant::Bold | Variant::Italic | Variant::BoldItalic => {
                has_delimited_token(pkg.leaf(), &variant)
                    && !has_delimited_token(slot.1.leaf(), &variant)
            }
            Variant::Other(_) => false,
        };
        if replace {
            slot.1 = pkg;
        }
        replace
    }

    /// Faces for text rendering; bold and italic are optional.
    ///
    /// The regular face is the `Regular` slot, or the first slot registered.
    pub fn faces(&self) -> Option<FaceSet> {
        let regular = self
            .get(&Variant::Regular)
            .or_else(|| self.slots.first().map(|(_, pkg)| pkg))?
            .clone();
        Some(FaceSet {
            regular,
            bold: self.get(&Variant::Bold).cloned(),
            italic: self.get(&Variant::Italic).cloned(),
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// The classified registry. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// All registry packages, in registry order
    packages: Vec<Package>,

    /// Family keys in first-seen order
    order: Vec<String>,

    families: HashMap<String, Family>,
}

impl Catalog {
    /// Reads and classifies a registry file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let packages = discovery::read_registry(path)?;
        Ok(Self::from_packages(packages))
    }

    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        let mut catalog = Self::default();
        for pkg in packages {
            catalog.insert(pkg);
        }
        debug!(
            packages = catalog.packages.len(),
            families = catalog.order.len(),
            "Catalog built"
        );
        catalog
    }

    fn insert(&mut self, pkg: Package) {
        let (family, variant) = classify(pkg.leaf());
        if !self.families.contains_key(&family) {
            self.order.push(family.clone());
        }
        self.families
            .entry(family)
            .or_default()
            .register(variant, pkg.clone());
        self.packages.push(pkg);
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn family(&self, name: &str) -> Option<&Family> {
        self.families.get(name)
    }

    /// Families in first-seen registry order.
    pub fn families(&self) -> impl Iterator<Item = (&str, &Family)> {
        self.order
            .iter()
            .filter_map(|name| self.families.get(name).map(|f| (name.as_str(), f)))
    }

    /// Resolves a family query: exact key first, else the first key in
    /// first-seen order that starts with `query`.
    ///
    /// The prefix fallback is order dependent: two registries listing the
    /// same packages in different orders may resolve a query differently.
    pub fn resolve_family(&self, query: &str) -> Result<(&str, &Family), CatalogError> {
        if let Some((name, family)) = self.families.get_key_value(query) {
            return Ok((name.as_str(), family));
        }
        self.families()
            .find(|(name, _)| name.starts_with(query))
            .ok_or_else(|| CatalogError::FamilyNotFound(query.to_string()))
    }

    /// Resolves a single package by leaf name or full identifier, falling
    /// back to the first package whose leaf starts with `query`.
    pub fn resolve_package(&self, query: &str) -> Result<&Package, CatalogError> {
        self.packages
            .iter()
            .find(|pkg| pkg.leaf() == query || pkg.id() == query)
            .or_else(|| self.packages.iter().find(|pkg| pkg.leaf().starts_with(query)))
            .ok_or_else(|| CatalogError::PackageNotFound(query.to_string()))
    }

    /// Packages whose leaf or identifier is listed in `names`; all packages
    /// when `names` is empty.
    pub fn select_packages(&self, names: &[String]) -> Vec<Package> {
        if names.is_empty() {
            return self.packages.clone();
        }
        self.packages
            .iter()
            .filter(|pkg| names.iter().any(|n| n == pkg.leaf() || n == pkg.id()))
            .cloned()
            .collect()
    }

    /// `family (variant, ...)` lines sorted by family name.
    pub fn listing(&self) -> Vec<String> {
        let mut names: Vec<&String> = self.order.iter().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| {
                let family = self.families.get(name)?;
                let variants: Vec<&str> = family.variants().map(Variant::token).collect();
                Some(format!("{name} ({})", variants.join(", ")))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

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

    #[test]
    fn test_classify_delimited() {
        assert_eq!(classify("abeezee_italic"), ("abeezee".into(), Variant::Italic));
        assert_eq!(classify("abeezee_bold"), ("abeezee".into(), Variant::Bold));
        assert_eq!(classify("youngserif_regular"), ("youngserif".into(), Variant::Regular));
    }

    #[test]
    fn test_classify_undelimited() {
        assert_eq!(
            classify("aaarghnormal"),
            ("aaarghnormal".into(), Variant::Regular)
        );
        assert_eq!(
            classify("fooboldcondensed"),
            ("fooboldcondensed".into(), Variant::Bold)
        );
        assert_eq!(classify("FooBoldItalic"), ("FooBoldItalic".into(), Variant::BoldItalic));
    }

    #[test]
    fn test_classify_substring_precedence() {
        assert_eq!(classify("foo_bolditalic"), ("foo".into(), Variant::BoldItalic));
        assert_eq!(classify("foo_italicbold"), ("foo".into(), Variant::BoldItalic));
        assert_eq!(classify("foo_extrabold"), ("foo".into(), Variant::Bold));
        assert_eq!(classify("foo_lightitalic"), ("foo".into(), Variant::Italic));
        assert_eq!(
            classify("foo_medium"),
            ("foo".into(), Variant::Other("medium".into()))
        );
    }

    #[test]
    fn test_classify_splits_on_last_delimiter() {
        assert_eq!(classify("open_sans_bold"), ("open_sans".into(), Variant::Bold));
    }

    #[test]
    fn test_every_package_lands_in_one_slot() {
        let cat = catalog(&["abeezee_regular", "abeezee_italic", "aaarghnormal"]);
        assert_eq!(cat.len(), 3);
        let abeezee = cat.family("abeezee").unwrap();
        assert_eq!(abeezee.len(), 2);
        assert_eq!(
            abeezee.get(&Variant::Italic).unwrap().leaf(),
            "abeezee_italic"
        );
        assert!(cat.family("aaarghnormal").unwrap().get(&Variant::Regular).is_some());
    }

    #[test]
    fn test_tie_break_prefers_delimited_token() {
        let cat = catalog(&["foo_regular", "foo_extrabold", "foo_bold"]);
        let foo = cat.family("foo").unwrap();
        assert_eq!(foo.get(&Variant::Bold).unwrap().leaf(), "foo_bold");
    }

    #[test]
    fn test_undelimited_name_never_competes_for_a_slot() {
        // No delimiter: its own family, so foo's Bold slot is uncontested
        let cat = catalog(&["foo_regular", "fooboldcondensed", "foo_bold"]);
        assert_eq!(
            cat.family("foo").unwrap().get(&Variant::Bold).unwrap().leaf(),
            "foo_bold"
        );
        let loose = cat.family("fooboldcondensed").unwrap();
        assert_eq!(loose.len(), 1);
        assert_eq!(loose.get(&Variant::Bold).unwrap().leaf(), "fooboldcondensed");
    }

    #[test]
    fn test_tie_break_keeps_first_loose_match() {
        let cat = catalog(&["foo_bold", "foo_extrabold"]);
        assert_eq!(
            cat.family("foo").unwrap().get(&Variant::Bold).unwrap().leaf(),
            "foo_bold"
        );
    }

    #[test]
    fn test_tie_break_last_regular_wins() {
        let a = Package::parse("gmlewis/fonts-a/bar_regular").unwrap();
        let b = Package::parse("gmlewis/fonts-b/bar_regular").unwrap();
        let cat = Catalog::from_packages([a, b.clone()]);
        assert_eq!(cat.family("bar").unwrap().get(&Variant::Regular), Some(&b));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let leaves = ["foo_regular", "foo_bold", "foo_boldx", "baz", "baz_italic"];
        let a = catalog(&leaves);
        let b = catalog(&leaves);
        for (name, family) in a.families() {
            assert_eq!(b.family(name), Some(family));
        }
    }

    #[test]
    fn test_resolve_family_exact_beats_prefix() {
        let cat = catalog(&["robotomono_regular", "roboto_regular"]);
        let (name, _) = cat.resolve_family("roboto").unwrap();
        assert_eq!(name, "roboto");
    }

    #[test]
    fn test_resolve_family_prefix_is_first_seen() {
        let cat = catalog(&["robotoslab_regular", "robotomono_regular"]);
        assert_eq!(cat.resolve_family("robo").unwrap().0, "robotoslab");

        let cat = catalog(&["robotomono_regular", "robotoslab_regular"]);
        assert_eq!(cat.resolve_family("robo").unwrap().0, "robotomono");
    }

    #[test]
    fn test_resolve_family_not_found_keeps_query() {
        let cat = catalog(&["abeezee_regular"]);
        let err = cat.resolve_family("zzz").unwrap_err();
        assert!(matches!(err, CatalogError::FamilyNotFound(ref q) if q == "zzz"));
        assert!(err.to_string().contains("'zzz'"));
    }

    #[test]
    fn test_resolve_package() {
        let cat = catalog(&["aileron_regular", "aileron_bold"]);
        assert_eq!(cat.resolve_package("aileron_bold").unwrap().leaf(), "aileron_bold");
        assert_eq!(cat.resolve_package("aileron").unwrap().leaf(), "aileron_regular");
        assert_eq!(
            cat.resolve_package("gmlewis/fonts-a/aileron_bold").unwrap().leaf(),
            "aileron_bold"
        );
        assert!(cat.resolve_package("zapf").is_err());
    }

    #[test]
    fn test_select_packages() {
        let cat = catalog(&["a_regular", "b_regular", "c_regular"]);
        assert_eq!(cat.select_packages(&[]).len(), 3);
        let picked = cat.select_packages(&["b_regular".into(), "gmlewis/fonts-a/c_regular".into()]);
        let leaves: Vec<&str> = picked.iter().map(Package::leaf).collect();
        assert_eq!(leaves, vec!["b_regular", "c_regular"]);
    }

    #[test]
    fn test_faces_fall_back_to_first_slot() {
        let cat = catalog(&["qux_italic", "qux_bold"]);
        let faces = cat.family("qux").unwrap().faces().unwrap();
        assert_eq!(faces.regular.leaf(), "qux_italic");
        assert_eq!(faces.bold.unwrap().leaf(), "qux_bold");
    }

    #[test]
    fn test_listing_sorted() {
        let cat = catalog(&["zeta_regular", "alpha_bold", "alpha_regular"]);
        assert_eq!(
            cat.listing(),
            vec!["alpha (bold, regular)".to_string(), "zeta (regular)".to_string()]
        );
    }
}
