//! End-to-end ingest: taxonomy → cluster stream → filter → transform → store
//!
//! Strictly sequential. Any error aborts the run; batches committed before the
//! failure stay in the database.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::context::RunContext;
use crate::error::{ParseError, Result};
use crate::filter::{EntryFilter, FilterDecision};
use crate::storage::{BatchWriter, SqliteStore, UpsStore};
use crate::taxonomy::TaxonomyIndex;
use crate::transform::{EntryTransform, TransformOutcome};
use crate::uniref::{ClusterEntry, ClusterEntryStream};

pub struct Pipeline {
    config: IngestConfig,
}

impl Pipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Load the taxonomy file and record its counts on `ctx`
    pub fn load_taxonomy(path: &Path, ctx: &mut RunContext) -> Result<TaxonomyIndex> {
        let (taxonomy, report) = TaxonomyIndex::load_path(path)?;
        ctx.record_taxonomy(&report);
        Ok(taxonomy)
    }

    /// Run every entry through filter, transform and writer, committing the
    /// final partial batch before returning the store.
    pub fn process<I, S>(
        &self,
        taxonomy: Arc<TaxonomyIndex>,
        entries: I,
        store: S,
        ctx: &mut RunContext,
    ) -> Result<S>
    where
        I: IntoIterator<Item = std::result::Result<ClusterEntry, ParseError>>,
        S: UpsStore,
    {
        let root = self.config.root_taxon.as_str();
        if taxonomy.parent(root).is_none() {
            warn!(root_taxon = root, "Root taxon not present in taxonomy; no entry can qualify");
        }
        info!(
            root_taxon = root,
            hash_algorithm = %self.config.hash_algorithm,
            flush_every = self.config.flush_every,
            "Parse & store UPS information"
        );

        let mut filter = EntryFilter::new(taxonomy, root);
        let mut transform = EntryTransform::new(self.config.hash_algorithm);
        let mut writer = BatchWriter::new(store, self.config.flush_every);

        for entry in entries {
            let entry = entry?;
            ctx.counters_mut().entries_read += 1;

            match filter.decide(&entry)? {
                FilterDecision::Fragment => {
                    ctx.counters_mut().fragments += 1;
                    continue;
                },
                FilterDecision::OutsideRoot => {
                    ctx.counters_mut().outside_root += 1;
                    continue;
                },
                FilterDecision::Accepted => {
                    ctx.counters_mut().accepted += 1;
                },
            }

            match transform.transform(&entry)? {
                TransformOutcome::Record(record) => {
                    writer.write(&record)?;
                    ctx.record_written(&entry, &record);
                },
                TransformOutcome::AlreadySeen { hash, cluster_id } => {
                    ctx.counters_mut().already_seen += 1;
                    warn!(hash = %hash, cluster = %cluster_id, "Cluster repeated; skipping");
                },
            }
        }

        let (store, commits) = writer.finalize()?;
        ctx.counters_mut().commits = commits;
        ctx.finish();

        let counters = ctx.counters();
        info!(
            entries_read = counters.entries_read,
            fragments = counters.fragments,
            outside_root = counters.outside_root,
            already_seen = counters.already_seen,
            written = counters.written,
            commits = counters.commits,
            "Parsed UPS: {}",
            counters.written
        );
        Ok(store)
    }

    /// Open the cluster XML and database, then [`process`](Self::process)
    pub fn run_files(
        &self,
        taxonomy: Arc<TaxonomyIndex>,
        xml_path: &Path,
        db_path: &Path,
        ctx: &mut RunContext,
    ) -> Result<SqliteStore> {
        let store = SqliteStore::open(db_path, &self.config.store)?;
        let entries = ClusterEntryStream::open(xml_path)?;
        self.process(taxonomy, entries, store, ctx)
    }
}
