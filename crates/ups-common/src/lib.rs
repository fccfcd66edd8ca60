//! UPS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the UPS ingest tooling.
//!
//! # Overview
//!
//! - **Error Handling**: Shared error type and result alias
//! - **Checksums**: Sequence digests and file integrity helpers
//! - **Logging**: `tracing` subscriber setup, including the audit log
//! - **Types**: Small shared enums such as [`types::ChecksumAlgorithm`]
//!
//! # Example
//!
//! ```no_run
//! use ups_common::checksum::sequence_hash;
//! use ups_common::types::ChecksumAlgorithm;
//!
//! let hash = sequence_hash("MKV", ChecksumAlgorithm::Md5);
//! assert_eq!(hash.len(), 32);
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, UpsError};
