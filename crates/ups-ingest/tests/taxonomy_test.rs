//! TaxonomyIndex loading and lineage properties

mod common;

use proptest::prelude::*;
use ups_ingest::error::TaxonomyError;
use ups_ingest::taxonomy::{TaxonomyIndex, ROOT_SENTINEL};

/// `t0 -> t1 -> ... -> t{len-1} -> 1`
fn chain(len: usize) -> (TaxonomyIndex, Vec<String>) {
    let ids: Vec<String> = (0..len).map(|i| format!("t{}", i)).collect();
    let mut index = TaxonomyIndex::new();
    index.insert(ROOT_SENTINEL, ROOT_SENTINEL);
    for pair in ids.windows(2) {
        index.insert(pair[0].clone(), pair[1].clone());
    }
    if let Some(last) = ids.last() {
        index.insert(last.clone(), ROOT_SENTINEL);
    }
    (index, ids)
}

proptest! {
    #[test]
    fn chain_members_are_ancestors(len in 2usize..40) {
        let (index, ids) = chain(len);
        for ancestor in &ids[1..] {
            prop_assert!(index.is_descendant(&ids[0], ancestor).unwrap());
        }
    }

    #[test]
    fn lineage_is_directed(len in 2usize..40, i in 0usize..40, j in 0usize..40) {
        let (index, ids) = chain(len);
        let (i, j) = (i % len, j % len);
        prop_assert_eq!(index.is_descendant(&ids[i], &ids[j]).unwrap(), i < j);
    }

    #[test]
    fn inserted_pairs_are_descendants(pairs in prop::collection::vec((1u32..500, 2u32..500), 1..50)) {
        let mut index = TaxonomyIndex::new();
        for (child, parent) in &pairs {
            index.insert(child.to_string(), parent.to_string());
        }
        for (child, parent) in &pairs {
            let (child, parent) = (child.to_string(), parent.to_string());
            // later pairs overwrite earlier ones for the same child
            if index.parent(&child) == Some(parent.as_str()) {
                prop_assert!(index.is_descendant(&child, &parent).unwrap());
            }
        }
    }

    #[test]
    fn unknown_ids_never_descend(len in 2usize..20, unknown in "[a-z]{3,8}") {
        let (index, ids) = chain(len);
        let unknown = format!("x-{}", unknown);
        prop_assert!(!index.is_descendant(&unknown, &ids[len - 1]).unwrap());
        prop_assert!(!index.is_descendant(&ids[0], &unknown).unwrap());
    }
}

#[test]
fn test_root_sentinel_never_matches() {
    let (index, ids) = chain(5);
    assert!(!index.is_descendant(&ids[0], ROOT_SENTINEL).unwrap());
}

#[test]
fn test_load_nodes_file() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_nodes(dir.path(), &[("1", "1"), ("131567", "1"), ("2", "131567"), ("562", "2")]);

    let (index, report) = TaxonomyIndex::load_path(&path).unwrap();
    assert_eq!(report.loaded, 4);
    assert_eq!(report.skipped, 0);
    assert_eq!(index.parent("562"), Some("2"));
    assert!(index.is_descendant("562", "131567").unwrap());
    assert!(!index.is_descendant("131567", "2").unwrap());
}

#[test]
fn test_load_gzipped_nodes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodes.dmp.gz");
    std::fs::write(&path, common::gzip("1\t|\t1\t|\tno rank\t|\n2\t|\t1\t|\tsuperkingdom\t|\n")).unwrap();

    let (index, report) = TaxonomyIndex::load_path(&path).unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(index.len(), 2);
}

#[test]
fn test_cycle_is_an_error() {
    let index = TaxonomyIndex::from_pairs([("a", "b"), ("b", "c"), ("c", "a")]);
    let err = index.is_descendant("a", "z").unwrap_err();
    assert!(matches!(err, TaxonomyError::Cycle { ref candidate, .. } if candidate == "a"));
}
