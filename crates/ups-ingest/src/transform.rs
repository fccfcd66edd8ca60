//! Raw entry → `ups` row
//!
//! Hashes the representative sequence, guards hash uniqueness, normalizes the
//! product name and picks the column set.

use std::collections::HashMap;
use ups_common::checksum::sequence_hash;
use ups_common::types::ChecksumAlgorithm;

use crate::error::TransformError;
use crate::uniref::{CanonicalRecord, ClusterEntry, ColumnSet};

/// Product names that carry no information
const PLACEHOLDER_PRODUCTS: [&str; 2] = ["hypothetical protein", "uncharacterized protein"];

/// Hash → first cluster id that produced it
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashMap<String, String>,
}

/// Result of registering a hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    New,
    /// Same hash, same cluster id: already written
    Repeat,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash` for `cluster_id`, failing if another cluster owns it
    pub fn register(&mut self, hash: &str, cluster_id: &str) -> Result<DedupOutcome, TransformError> {
        match self.seen.get(hash) {
            Some(first) if first == cluster_id => Ok(DedupOutcome::Repeat),
            Some(first) => Err(TransformError::DuplicateHash {
                hash: hash.to_string(),
                first: first.clone(),
                second: cluster_id.to_string(),
            }),
            None => {
                self.seen.insert(hash.to_string(), cluster_id.to_string());
                Ok(DedupOutcome::New)
            },
        }
    }

    pub fn cluster_for(&self, hash: &str) -> Option<&str> {
        self.seen.get(hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// What the transform made of an accepted entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutcome {
    Record(CanonicalRecord),
    AlreadySeen { hash: String, cluster_id: String },
}

pub struct EntryTransform {
    algorithm: ChecksumAlgorithm,
    dedup: DedupIndex,
}

impl EntryTransform {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self {
            algorithm,
            dedup: DedupIndex::new(),
        }
    }

    pub fn dedup(&self) -> &DedupIndex {
        &self.dedup
    }

    pub fn hash(&self, sequence: &str) -> String {
        sequence_hash(sequence, self.algorithm)
    }

    pub fn transform(&mut self, entry: &ClusterEntry) -> Result<TransformOutcome, TransformError> {
        let hash = self.hash(&entry.sequence);

        if self.dedup.register(&hash, &entry.cluster_id)? == DedupOutcome::Repeat {
            return Ok(TransformOutcome::AlreadySeen {
                hash,
                cluster_id: entry.cluster_id.clone(),
            });
        }

        let columns = match &entry.uniref90_id {
            Some(uniref90_id) => ColumnSet::WithCoarserCluster {
                uniref90_id: uniref90_id.clone(),
            },
            None => ColumnSet::WithProduct {
                product: normalize_product(entry.product.as_deref()),
            },
        };

        Ok(TransformOutcome::Record(CanonicalRecord {
            hash,
            length: entry.length,
            uniref100_id: entry.cluster_id.clone(),
            uniparc_id: entry.uniparc_id.clone(),
            uniprotkb_acc: entry.uniprotkb_acc.clone(),
            columns,
        }))
    }
}

/// Drop placeholder product names, compared case-insensitively; any other
/// value is kept verbatim
pub fn normalize_product(product: Option<&str>) -> Option<String> {
    let product = product?;
    let trimmed = product.trim();
    if trimmed.is_empty()
        || PLACEHOLDER_PRODUCTS
            .iter()
            .any(|placeholder| trimmed.eq_ignore_ascii_case(placeholder))
    {
        None
    } else {
        Some(product.to_string())
    }
}
