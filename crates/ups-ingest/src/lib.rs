//! UPS Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Builds the `ups` (unique protein sequences) table from a UniRef100 XML
//! dump and an NCBI `nodes.dmp` taxonomy.
//!
//! # Stages
//!
//! - **Taxonomy**: child → parent index with a bounded ancestor walk
//! - **UniRef**: streaming `<entry>` reader over (gzipped) XML
//! - **Filter**: drops fragments and clusters outside the root taxon
//! - **Transform**: sequence hash, duplicate guard, product cleanup
//! - **Storage**: batched SQLite inserts
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use ups_ingest::{IngestConfig, Pipeline, RunContext};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut ctx = RunContext::silent();
//!     let taxonomy = Pipeline::load_taxonomy(Path::new("nodes.dmp"), &mut ctx)?;
//!     let pipeline = Pipeline::new(IngestConfig::default());
//!     pipeline.run_files(
//!         Arc::new(taxonomy),
//!         Path::new("uniref100.xml.gz"),
//!         Path::new("ups.db"),
//!         &mut ctx,
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod storage;
pub mod taxonomy;
pub mod transform;
pub mod uniref;

pub use config::{IngestConfig, StoreConfig};
pub use context::{RunContext, RunCounters, RunSummary};
pub use error::{IngestError, Result};
pub use pipeline::Pipeline;
pub use taxonomy::TaxonomyIndex;
