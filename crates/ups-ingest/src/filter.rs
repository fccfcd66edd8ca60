//! Fragment and taxonomic-lineage filter

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::TaxonomyError;
use crate::taxonomy::TaxonomyIndex;
use crate::uniref::ClusterEntry;

/// Why an entry was kept or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accepted,
    Fragment,
    OutsideRoot,
}

/// Keeps non-fragment entries whose common taxon or representative taxon
/// descends from `root`.
///
/// Answers are memoized per taxon id; the cache is bounded by the number of
/// distinct taxa in the input.
pub struct EntryFilter {
    taxonomy: Arc<TaxonomyIndex>,
    root: String,
    memo: HashMap<String, bool>,
}

impl EntryFilter {
    pub fn new(taxonomy: Arc<TaxonomyIndex>, root: impl Into<String>) -> Self {
        Self {
            taxonomy,
            root: root.into(),
            memo: HashMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn decide(&mut self, entry: &ClusterEntry) -> Result<FilterDecision, TaxonomyError> {
        if entry.is_fragment {
            return Ok(FilterDecision::Fragment);
        }
        if self.under_root(&entry.common_taxon_id)?
            || self.under_root(&entry.representative_taxon_id)?
        {
            Ok(FilterDecision::Accepted)
        } else {
            Ok(FilterDecision::OutsideRoot)
        }
    }

    pub fn accept(&mut self, entry: &ClusterEntry) -> Result<bool, TaxonomyError> {
        Ok(self.decide(entry)? == FilterDecision::Accepted)
    }

    fn under_root(&mut self, taxon: &str) -> Result<bool, TaxonomyError> {
        if let Some(&known) = self.memo.get(taxon) {
            return Ok(known);
        }
        let answer = self.taxonomy.is_descendant(taxon, &self.root)?;
        self.memo.insert(taxon.to_string(), answer);
        Ok(answer)
    }
}
