//! Ingest configuration
//!
//! Values come from the defaults below, then the environment (a `.env` file
//! is honoured), then explicit overrides from the command line.

use serde::{Deserialize, Serialize};
use ups_common::types::ChecksumAlgorithm;

use crate::error::ConfigError;

// ============================================================================
// Defaults
// ============================================================================

/// Default root taxon: Bacteria.
pub const DEFAULT_ROOT_TAXON: &str = "2";

/// Records per committed batch.
pub const DEFAULT_FLUSH_EVERY: u64 = 1_000_000;

/// Written records between progress reports.
pub const DEFAULT_PROGRESS_EVERY: u64 = 1_000_000;

pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// SQLite page cache, in pages.
pub const DEFAULT_CACHE_SIZE: i64 = 100_000;

/// Memory-mapped I/O window: 20 GiB.
pub const DEFAULT_MMAP_SIZE: u64 = 20 * 1024 * 1024 * 1024;

/// SQLite auxiliary worker threads.
pub const DEFAULT_SQLITE_THREADS: u32 = 2;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Entries must descend from this taxon to be kept
    pub root_taxon: String,
    pub flush_every: u64,
    pub progress_every: u64,
    pub hash_algorithm: ChecksumAlgorithm,
    pub store: StoreConfig,
}

/// SQLite tuning for the one-shot bulk load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub page_size: u32,
    pub cache_size: i64,
    pub mmap_size: u64,
    pub threads: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cache_size: DEFAULT_CACHE_SIZE,
            mmap_size: DEFAULT_MMAP_SIZE,
            threads: DEFAULT_SQLITE_THREADS,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root_taxon: DEFAULT_ROOT_TAXON.to_string(),
            flush_every: DEFAULT_FLUSH_EVERY,
            progress_every: DEFAULT_PROGRESS_EVERY,
            hash_algorithm: ChecksumAlgorithm::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults plus environment overrides
    ///
    /// - `UPS_ROOT_TAXON`
    /// - `UPS_FLUSH_EVERY`
    /// - `UPS_PROGRESS_EVERY`
    /// - `UPS_HASH_ALGORITHM` (md5, sha256)
    /// - `UPS_CACHE_SIZE`, `UPS_MMAP_SIZE`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(root) = std::env::var("UPS_ROOT_TAXON") {
            config.root_taxon = root.trim().to_string();
        }
        if let Some(n) = env_parse("UPS_FLUSH_EVERY")? {
            config.flush_every = n;
        }
        if let Some(n) = env_parse("UPS_PROGRESS_EVERY")? {
            config.progress_every = n;
        }
        if let Some(algorithm) = env_parse("UPS_HASH_ALGORITHM")? {
            config.hash_algorithm = algorithm;
        }
        if let Some(n) = env_parse("UPS_CACHE_SIZE")? {
            config.store.cache_size = n;
        }
        if let Some(n) = env_parse("UPS_MMAP_SIZE")? {
            config.store.mmap_size = n;
        }

        Ok(config)
    }

    pub fn with_root_taxon(mut self, root: impl Into<String>) -> Self {
        self.root_taxon = root.into();
        self
    }

    pub fn with_flush_every(mut self, n: u64) -> Self {
        self.flush_every = n;
        self
    }

    pub fn with_progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_taxon.trim().is_empty() {
            return Err(ConfigError::Invalid("root taxon cannot be empty".to_string()));
        }
        if self.root_taxon == crate::taxonomy::ROOT_SENTINEL {
            return Err(ConfigError::Invalid(format!(
                "root taxon cannot be the sentinel '{}': no entry would ever match",
                crate::taxonomy::ROOT_SENTINEL
            )));
        }
        if self.flush_every == 0 {
            return Err(ConfigError::Invalid("flush_every must be greater than 0".to_string()));
        }
        if self.progress_every == 0 {
            return Err(ConfigError::Invalid("progress_every must be greater than 0".to_string()));
        }
        if !self.store.page_size.is_power_of_two()
            || !(512..=65536).contains(&self.store.page_size)
        {
            return Err(ConfigError::Invalid(format!(
                "page_size must be a power of two between 512 and 65536, got {}",
                self.store.page_size
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}
