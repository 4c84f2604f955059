//! Property-based tests for batching and classification.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashSet;

use proptest::prelude::*;

use fontbatch::catalog::{classify, Catalog};
use fontbatch::model::{Package, UnitRole, Variant};
use fontbatch::units::grid_units;

/// Strategy for generating family names (may contain the delimiter).
fn family_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,10}(_[a-z0-9]{1,6})?"
}

fn canonical_variant() -> impl Strategy<Value = Variant> {
    prop_oneof![
        Just(Variant::Regular),
        Just(Variant::Italic),
        Just(Variant::Bold),
        Just(Variant::BoldItalic),
    ]
}

fn corpus(len: usize) -> Vec<Package> {
    (0..len)
        .map(|i| Package::parse(&format!("gmlewis/fonts-a/font{i}_regular")).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn batches_partition_the_corpus(len in 0usize..600, batch_size in 1usize..250) {
        let corpus = corpus(len);
        let label = Package::parse("gmlewis/fonts-a/aileron_bold").unwrap();
        let units = grid_units(&corpus, batch_size, &label, &["ABC".to_string()], 6, None);

        prop_assert_eq!(units.len(), len.div_ceil(batch_size));
        prop_assert!(units.iter().all(|u| u.packages.len() <= batch_size && !u.packages.is_empty()));
        prop_assert!(units.iter().all(|u| u.role == UnitRole::Grouped));

        let flattened: Vec<&Package> = units.iter().flat_map(|u| u.packages.iter()).collect();
        prop_assert_eq!(flattened.len(), corpus.len());
        prop_assert!(flattened.iter().zip(corpus.iter()).all(|(a, b)| *a == b));

        let names: HashSet<&str> = units.iter().map(|u| u.name.as_str()).collect();
        prop_assert_eq!(names.len(), units.len());
    }

    #[test]
    fn canonical_suffix_round_trips(family in family_name(), variant in canonical_variant()) {
        let leaf = format!("{}_{}", family, variant.token());
        prop_assert_eq!(classify(&leaf), (family, variant));
    }

    #[test]
    fn every_package_lands_in_a_family(leaves in prop::collection::vec("[a-z]{1,6}(_[a-z]{1,8})?", 1..40)) {
        let packages: Vec<Package> = leaves
            .iter()
            .map(|leaf| Package::parse(&format!("gmlewis/fonts-a/{leaf}")).unwrap())
            .collect();
        let catalog = Catalog::from_packages(packages.clone());

        prop_assert_eq!(catalog.len(), packages.len());
        for pkg in &packages {
            let (family, _) = classify(pkg.leaf());
            prop_assert!(catalog.family(&family).is_some());
        }
        prop_assert!(catalog.families().all(|(_, f)| !f.is_empty()));
    }
}
