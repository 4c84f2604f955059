//! Maintenance commands run with the default `.` root.
//!
//! Kept in its own test binary: it changes the process working directory.

use fontbatch::audit::audit_siblings;
use fontbatch::config::PipelineConfig;
use fontbatch::discovery::{enumerate_packages, PACKAGE_MARKER};

#[test]
fn test_default_root_resolves_siblings_from_working_dir() {
    let workspace = tempfile::tempdir().unwrap();
    let root = workspace.path().join("fonts");
    std::fs::create_dir(&root).unwrap();
    let font = workspace.path().join("mbt-fonts-a").join("abeezee_bold");
    std::fs::create_dir_all(&font).unwrap();
    std::fs::write(font.join(PACKAGE_MARKER), "{}").unwrap();
    std::fs::write(font.join("font.mbt"), "a\nb\nc\n").unwrap();

    std::env::set_current_dir(&root).unwrap();
    let config = PipelineConfig::default();
    assert_eq!(config.root(), std::path::Path::new("."));

    let ids = enumerate_packages(config.root(), &config.sibling_prefix, config.owner()).unwrap();
    assert_eq!(ids, vec!["gmlewis/fonts-a/abeezee_bold"]);

    let findings = audit_siblings(config.root(), &config.sibling_prefix, 2).unwrap();
    assert_eq!(findings.len(), 1);
    assert!(findings[0].to_string().ends_with("abeezee_bold/font.mbt"));
}
