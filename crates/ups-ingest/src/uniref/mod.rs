//! UniRef100 XML ingestion
//!
//! - [`parser`]: streaming reader producing one [`ClusterEntry`] at a time
//! - [`models`]: raw entries and the canonical `ups` rows derived from them

pub mod models;
pub mod parser;

pub use models::{CanonicalRecord, ClusterEntry, ColumnSet};
pub use parser::{ClusterEntryStream, UNIREF_NAMESPACE};
