//! UniRef cluster data models

use serde::{Deserialize, Serialize};

use crate::taxonomy::ROOT_SENTINEL;

/// One `<entry>` from a UniRef100 document, as plain owned values.
///
/// Lives only while the pipeline decides what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    /// UniRef100 id without the `UniRef100_` prefix
    pub cluster_id: String,
    pub is_fragment: bool,
    /// `common taxon ID` property, or the root sentinel when absent
    pub common_taxon_id: String,
    /// Representative member's `NCBI taxonomy` property, or the root sentinel
    pub representative_taxon_id: String,
    /// Upper-cased representative sequence
    pub sequence: String,
    pub length: u32,
    /// UniRef90 id without the `UniRef90_` prefix
    pub uniref90_id: Option<String>,
    /// UniParc id without the `UPI` prefix
    pub uniparc_id: Option<String>,
    pub uniprotkb_acc: Option<String>,
    pub product: Option<String>,
}

impl ClusterEntry {
    /// Minimal entry; optional fields empty, taxa set to the sentinel
    pub fn new(cluster_id: impl Into<String>, sequence: impl Into<String>) -> Self {
        let sequence = sequence.into().to_ascii_uppercase();
        Self {
            cluster_id: cluster_id.into(),
            is_fragment: false,
            common_taxon_id: ROOT_SENTINEL.to_string(),
            representative_taxon_id: ROOT_SENTINEL.to_string(),
            length: sequence.chars().count() as u32,
            sequence,
            uniref90_id: None,
            uniparc_id: None,
            uniprotkb_acc: None,
            product: None,
        }
    }

    pub fn with_common_taxon(mut self, taxon: impl Into<String>) -> Self {
        self.common_taxon_id = taxon.into();
        self
    }

    pub fn with_representative_taxon(mut self, taxon: impl Into<String>) -> Self {
        self.representative_taxon_id = taxon.into();
        self
    }

    pub fn with_fragment(mut self, is_fragment: bool) -> Self {
        self.is_fragment = is_fragment;
        self
    }

    pub fn with_uniref90(mut self, id: impl Into<String>) -> Self {
        self.uniref90_id = Some(id.into());
        self
    }

    pub fn with_uniparc(mut self, id: impl Into<String>) -> Self {
        self.uniparc_id = Some(id.into());
        self
    }

    pub fn with_accession(mut self, acc: impl Into<String>) -> Self {
        self.uniprotkb_acc = Some(acc.into());
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }
}

/// Which optional columns a record is written with.
///
/// A UniRef90 id means gene/product annotation is left to the UniRef90
/// cluster, so the product column is not written at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSet {
    WithCoarserCluster { uniref90_id: String },
    WithProduct { product: Option<String> },
}

/// A row of the `ups` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub hash: String,
    pub length: u32,
    pub uniref100_id: String,
    pub uniparc_id: Option<String>,
    pub uniprotkb_acc: Option<String>,
    pub columns: ColumnSet,
}

impl CanonicalRecord {
    pub fn uniref90_id(&self) -> Option<&str> {
        match &self.columns {
            ColumnSet::WithCoarserCluster { uniref90_id } => Some(uniref90_id),
            ColumnSet::WithProduct { .. } => None,
        }
    }

    /// Product as written; `None` both when omitted and when null
    pub fn product(&self) -> Option<&str> {
        match &self.columns {
            ColumnSet::WithCoarserCluster { .. } => None,
            ColumnSet::WithProduct { product } => product.as_deref(),
        }
    }

    pub fn includes_product_column(&self) -> bool {
        matches!(self.columns, ColumnSet::WithProduct { .. })
    }
}
