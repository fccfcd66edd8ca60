//! Per-run state: counters, progress reporting, audit events and the final
//! summary.

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use ups_common::logging::AUDIT_TARGET;
use ups_common::types::ChecksumAlgorithm;

use crate::taxonomy::LoadReport;
use crate::uniref::{CanonicalRecord, ClusterEntry};

/// Running totals for one ingest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub taxa_loaded: u64,
    pub taxa_skipped: u64,
    pub entries_read: u64,
    pub fragments: u64,
    pub outside_root: u64,
    pub accepted: u64,
    pub already_seen: u64,
    pub written: u64,
    pub commits: u64,
}

/// Where progress reports go
pub trait ProgressSink: Send {
    fn progress(&mut self, counters: &RunCounters);

    fn finished(&mut self, counters: &RunCounters);
}

/// Spinner on the terminal
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message("Parsing UniRef100 clusters...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn progress(&mut self, counters: &RunCounters) {
        self.bar.set_message(format!(
            "{} entries read, {} written",
            counters.entries_read, counters.written
        ));
    }

    fn finished(&mut self, counters: &RunCounters) {
        self.bar
            .finish_with_message(format!("Stored {} unique sequences", counters.written));
    }
}

/// Progress as `info!` lines
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&mut self, counters: &RunCounters) {
        info!(
            entries_read = counters.entries_read,
            written = counters.written,
            "... {}",
            counters.written
        );
    }

    fn finished(&mut self, counters: &RunCounters) {
        info!(written = counters.written, "Parsed UPS: {}", counters.written);
    }
}

#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn progress(&mut self, _counters: &RunCounters) {}

    fn finished(&mut self, _counters: &RunCounters) {}
}

/// Counters and progress sink handed to the pipeline for one run
pub struct RunContext {
    counters: RunCounters,
    sink: Box<dyn ProgressSink>,
    progress_every: u64,
    started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new(sink: Box<dyn ProgressSink>, progress_every: u64) -> Self {
        Self {
            counters: RunCounters::default(),
            sink,
            progress_every: progress_every.max(1),
            started_at: Utc::now(),
        }
    }

    pub fn silent() -> Self {
        Self::new(Box::new(SilentProgress), u64::MAX)
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut RunCounters {
        &mut self.counters
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn record_taxonomy(&mut self, report: &LoadReport) {
        self.counters.taxa_loaded = report.loaded as u64;
        self.counters.taxa_skipped = report.skipped as u64;
        info!(skipped = report.skipped, "Stored tax ids: {}", report.loaded);
    }

    /// Count one persisted record, emit its audit event and report
    /// progress on every `progress_every`-th write.
    pub fn record_written(&mut self, entry: &ClusterEntry, record: &CanonicalRecord) {
        self.counters.written += 1;
        audit(entry, record);
        if self.counters.written % self.progress_every == 0 {
            self.sink.progress(&self.counters);
        }
    }

    pub fn finish(&mut self) {
        self.sink.finished(&self.counters);
    }

    pub fn into_counters(self) -> RunCounters {
        self.counters
    }
}

/// Audit log next to the database: `ups.sqlite` → `ups.sqlite.audit.jsonl`
pub fn default_audit_path(db: &Path) -> PathBuf {
    let mut name = db.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "ups".into());
    name.push(".audit.jsonl");
    db.with_file_name(name)
}

fn audit(entry: &ClusterEntry, record: &CanonicalRecord) {
    debug!(
        target: AUDIT_TARGET,
        uniref100_id = %record.uniref100_id,
        uniref90_id = record.uniref90_id(),
        uniparc_id = record.uniparc_id.as_deref(),
        uniprotkb_acc = record.uniprotkb_acc.as_deref(),
        hash = %record.hash,
        length = record.length,
        common_taxon_id = %entry.common_taxon_id,
        representative_taxon_id = %entry.representative_taxon_id,
        product = record.product(),
        "Inserted UPS record"
    );
}

/// Digest of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputChecksum {
    pub path: String,
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

/// Final report of a run, written as JSON with `--summary`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub root_taxon: String,
    pub hash_algorithm: ChecksumAlgorithm,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub counters: RunCounters,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputChecksum>,
}

impl RunSummary {
    pub fn new(
        root_taxon: impl Into<String>,
        hash_algorithm: ChecksumAlgorithm,
        started_at: DateTime<Utc>,
        counters: RunCounters,
    ) -> Self {
        let finished_at = Utc::now();
        let duration_secs = (finished_at - started_at).num_milliseconds().max(0) as f64 / 1000.0;
        Self {
            root_taxon: root_taxon.into(),
            hash_algorithm,
            started_at,
            finished_at,
            duration_secs,
            counters,
            inputs: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<InputChecksum>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn write_json(&self, path: &Path) -> ups_common::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
