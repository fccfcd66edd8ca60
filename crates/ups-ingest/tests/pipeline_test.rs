//! End-to-end ingest from files on disk into SQLite

mod common;

use common::ClusterFixture;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use ups_ingest::error::{IngestError, TransformError};
use ups_ingest::{IngestConfig, Pipeline, RunContext};

/// `5 -> 2 -> 1` plus an unrelated `9 -> 1`
const NODES: &[(&str, &str)] = &[("1", "1"), ("2", "1"), ("5", "2"), ("9", "1")];

struct Run {
    _dir: tempfile::TempDir,
    db: std::path::PathBuf,
    result: ups_ingest::Result<()>,
    ctx: RunContext,
}

fn run(entries: &[ClusterFixture], config: IngestConfig) -> Run {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let nodes = common::write_nodes(dir.path(), NODES);
    let xml = common::write_uniref(dir.path(), entries);
    let db = dir.path().join("ups.db");

    let mut ctx = RunContext::silent();
    let result = Pipeline::load_taxonomy(&nodes, &mut ctx).and_then(|taxonomy| {
        Pipeline::new(config)
            .run_files(Arc::new(taxonomy), &xml, &db, &mut ctx)
            .map(|_| ())
    });

    Run {
        _dir: dir,
        db,
        result,
        ctx,
    }
}

type Row = (String, i64, Option<String>, Option<String>, Option<String>, Option<String>, Option<String>);

fn rows(db: &Path) -> Vec<Row> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT hash, length, uniref100_id, uniref90_id, uniparc_id, uniprotkb_acc, product \
             FROM ups ORDER BY uniref100_id",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}

#[test]
fn test_descendant_entry_is_persisted() {
    let run = run(
        &[ClusterFixture::new("A0A001", "MKVLA")
            .common_taxon("5")
            .uniparc("00003B0FD4")
            .accession("A0A001")],
        IngestConfig::default().with_root_taxon("2"),
    );
    run.result.unwrap();

    let rows = rows(&run.db);
    assert_eq!(rows.len(), 1);
    let (hash, length, uniref100, uniref90, uniparc, acc, product) = &rows[0];
    assert_eq!(hash, "78f24a5d046064dc4f4b7bf0b4386891");
    assert_eq!(*length, 5);
    assert_eq!(uniref100.as_deref(), Some("A0A001"));
    assert_eq!(uniref90, &None);
    assert_eq!(uniparc.as_deref(), Some("00003B0FD4"));
    assert_eq!(acc.as_deref(), Some("A0A001"));
    assert_eq!(product, &None);
    assert_eq!(run.ctx.counters().taxa_loaded, 4);
}

#[test]
fn test_sha256_hash() {
    let run = run(
        &[ClusterFixture::new("A0A001", "mkvla").common_taxon("5")],
        IngestConfig::default().with_hash_algorithm(ups_common::types::ChecksumAlgorithm::Sha256),
    );
    run.result.unwrap();
    assert_eq!(
        rows(&run.db)[0].0,
        "069d329ad0b96b2a4e2bb24829ca6f4ff075968943fcd61d862407f06d32af93"
    );
}

#[test]
fn test_divergent_duplicate_aborts() {
    let run = run(
        &[
            ClusterFixture::new("A1", "MKVLA").common_taxon("5"),
            ClusterFixture::new("B2", "MKVLA").common_taxon("5"),
        ],
        IngestConfig::default(),
    );

    match run.result {
        Err(IngestError::Transform(TransformError::DuplicateHash { first, second, .. })) => {
            assert_eq!(first, "A1");
            assert_eq!(second, "B2");
        },
        other => panic!("expected duplicate error, got {:?}", other),
    }
    let message = format!(
        "{}",
        TransformError::DuplicateHash {
            hash: "h".into(),
            first: "A1".into(),
            second: "B2".into()
        }
    );
    assert!(message.contains("A1") && message.contains("B2"));
}

#[test]
fn test_product_rules() {
    let run = run(
        &[
            ClusterFixture::new("A1", "MKVA")
                .common_taxon("5")
                .product("Hypothetical Protein"),
            ClusterFixture::new("A2", "MKVB")
                .common_taxon("5")
                .uniref90("Q6GZX4")
                .product("DNA gyrase subunit A"),
            ClusterFixture::new("A3", "MKVC")
                .common_taxon("5")
                .product("Chaperone protein DnaK"),
        ],
        IngestConfig::default(),
    );
    run.result.unwrap();

    let rows = rows(&run.db);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].6, None);
    assert_eq!(rows[1].3.as_deref(), Some("Q6GZX4"));
    assert_eq!(rows[1].6, None);
    assert_eq!(rows[2].6.as_deref(), Some("Chaperone protein DnaK"));
}

#[test]
fn test_fragments_and_outsiders_excluded() {
    let run = run(
        &[
            ClusterFixture::new("A1", "MKVA").common_taxon("5").fragment(),
            ClusterFixture::new("A2", "MKVB").common_taxon("9"),
            ClusterFixture::new("A3", "MKVC").common_taxon("9").representative_taxon("5"),
            ClusterFixture::new("A4", "MKVD"),
        ],
        IngestConfig::default(),
    );
    run.result.unwrap();

    let rows = rows(&run.db);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].2.as_deref(), Some("A3"));

    let counters = run.ctx.counters();
    assert_eq!(counters.entries_read, 4);
    assert_eq!(counters.fragments, 1);
    assert_eq!(counters.outside_root, 2);
    assert_eq!(counters.written, 1);
}

#[test]
fn test_batch_boundary() {
    let entries: Vec<_> = ["MKVA", "MKVB", "MKVC", "MKVD"]
        .iter()
        .enumerate()
        .map(|(i, seq)| ClusterFixture::new(&format!("A{}", i), seq).common_taxon("5"))
        .collect();

    let run = run(&entries, IngestConfig::default().with_flush_every(3));
    run.result.unwrap();
    assert_eq!(run.ctx.counters().commits, 2);
    assert_eq!(rows(&run.db).len(), 4);
}

#[test]
fn test_root_absent_from_taxonomy_keeps_nothing() {
    let run = run(
        &[ClusterFixture::new("A1", "MKVA").common_taxon("5")],
        IngestConfig::default().with_root_taxon("2759"),
    );
    run.result.unwrap();
    assert!(rows(&run.db).is_empty());
    assert_eq!(run.ctx.counters().outside_root, 1);
}
