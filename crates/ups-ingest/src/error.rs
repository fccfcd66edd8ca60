//! Error types for the ingest pipeline
//!
//! Every variant here is fatal to a run. Soft conditions (unknown taxa,
//! missing optional properties) never surface as errors.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("IO error reading taxonomy: {0}")]
    Io(#[from] std::io::Error),

    #[error("Taxonomy cycle detected walking up from taxon {candidate}: no root after {limit} steps")]
    Cycle { candidate: String, limit: usize },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error reading cluster XML: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cluster XML at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Cluster entry {cluster} is missing required {field}")]
    MissingField { field: &'static str, cluster: String },

    #[error("Cluster XML ended inside entry {cluster}")]
    Truncated { cluster: String },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Duplicate sequence with divergent clusters: hash={hash}, first={first}, second={second}")]
    DuplicateHash {
        hash: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error preparing database: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level pipeline error
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Common(#[from] ups_common::UpsError),
}
