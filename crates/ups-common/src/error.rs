//! Error types shared by the UPS crates

use thiserror::Error;

/// Result type alias for shared UPS operations
pub type Result<T> = std::result::Result<T, UpsError>;

/// Errors raised by the shared utilities
#[derive(Error, Debug)]
pub enum UpsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown checksum algorithm: {0} (expected md5 or sha256)")]
    UnknownAlgorithm(String),
}
