//! UPS Ingest - build the unique protein sequences table

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use ups_common::checksum::compute_file_checksum;
use ups_common::logging::{init_logging, LogConfig, LogLevel};
use ups_common::types::ChecksumAlgorithm;
use ups_ingest::context::{default_audit_path, ConsoleProgress, InputChecksum, LogProgress, ProgressSink};
use ups_ingest::storage::SqliteStore;
use ups_ingest::{IngestConfig, Pipeline, RunContext, RunSummary, TaxonomyIndex};

#[derive(Parser, Debug)]
#[command(name = "ups-ingest")]
#[command(author, version, about = "Load UniRef100 clusters under one taxon into a UPS SQLite table")]
struct Cli {
    /// NCBI taxonomy nodes file (nodes.dmp, optionally gzipped)
    #[arg(long)]
    taxonomy: PathBuf,

    /// UniRef100 XML dump (optionally gzipped)
    #[arg(long)]
    xml: PathBuf,

    /// SQLite database to create or append to
    #[arg(long)]
    db: PathBuf,

    /// Only keep clusters descending from this taxon
    #[arg(long)]
    root_taxon: Option<String>,

    /// Records per committed transaction
    #[arg(long)]
    flush_every: Option<u64>,

    /// Written records between progress reports
    #[arg(long)]
    progress_every: Option<u64>,

    /// Sequence hash algorithm (md5, sha256)
    #[arg(long)]
    hash: Option<ChecksumAlgorithm>,

    /// Write a JSON run summary to this file
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Record SHA-256 digests of both inputs in the summary
    #[arg(long)]
    checksum_inputs: bool,

    /// Per-record audit log (JSON lines) [default: <db>.audit.jsonl]
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Report progress as log lines instead of a spinner
    #[arg(long)]
    no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let audit_log = cli.audit_log.clone().unwrap_or_else(|| default_audit_path(&cli.db));

    // Environment variables take precedence
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("ups-ingest")
        .audit_file(audit_log)
        .build()
        .merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    let mut config = IngestConfig::from_env()?;
    if let Some(root) = cli.root_taxon {
        config = config.with_root_taxon(root);
    }
    if let Some(n) = cli.flush_every {
        config = config.with_flush_every(n);
    }
    if let Some(n) = cli.progress_every {
        config = config.with_progress_every(n);
    }
    if let Some(algorithm) = cli.hash {
        config = config.with_hash_algorithm(algorithm);
    }
    config.validate()?;

    let sink: Box<dyn ProgressSink> = if cli.no_progress || !std::io::stderr().is_terminal() {
        Box::new(LogProgress)
    } else {
        Box::new(ConsoleProgress::new())
    };
    let mut ctx = RunContext::new(sink, config.progress_every);

    info!("Parse & store NCBI taxonomy...");
    let taxonomy_path = cli.taxonomy.clone();
    let db_path = cli.db.clone();
    let store_config = config.store.clone();
    let (taxonomy, store) = tokio::join!(
        tokio::task::spawn_blocking(move || TaxonomyIndex::load_path(taxonomy_path)),
        tokio::task::spawn_blocking(move || SqliteStore::open(&db_path, &store_config)),
    );
    let (taxonomy, report) = taxonomy
        .context("Taxonomy loader panicked")?
        .with_context(|| format!("Failed to load taxonomy from {}", cli.taxonomy.display()))?;
    let store = store
        .context("Database opener panicked")?
        .with_context(|| format!("Failed to open database {}", cli.db.display()))?;

    ctx.record_taxonomy(&report);

    let pipeline = Pipeline::new(config.clone());
    let xml_path = cli.xml.clone();
    let started_at = ctx.started_at();
    let (store, ctx) = tokio::task::spawn_blocking(move || {
        let entries = ups_ingest::uniref::ClusterEntryStream::open(&xml_path)?;
        let store = pipeline.process(Arc::new(taxonomy), entries, store, &mut ctx)?;
        Ok::<_, ups_ingest::IngestError>((store, ctx))
    })
    .await
    .context("Ingest task panicked")??;

    let stored = store.count()?;
    drop(store);
    info!(rows = stored, "Successfully initialized UPS table");

    if let Some(summary_path) = &cli.summary {
        let mut summary = RunSummary::new(
            config.root_taxon.clone(),
            config.hash_algorithm,
            started_at,
            ctx.into_counters(),
        );

        if cli.checksum_inputs {
            let inputs = [cli.taxonomy.clone(), cli.xml.clone()];
            let digests = tokio::task::spawn_blocking(move || {
                inputs
                    .iter()
                    .map(|path| {
                        compute_file_checksum(path, ChecksumAlgorithm::Sha256).map(|digest| InputChecksum {
                            path: path.display().to_string(),
                            algorithm: ChecksumAlgorithm::Sha256,
                            digest,
                        })
                    })
                    .collect::<ups_common::Result<Vec<_>>>()
            })
            .await
            .context("Checksum task panicked")??;
            summary = summary.with_inputs(digests);
        }

        summary
            .write_json(summary_path)
            .with_context(|| format!("Failed to write summary to {}", summary_path.display()))?;
        info!(path = %summary_path.display(), "Wrote run summary");
    }

    Ok(())
}
