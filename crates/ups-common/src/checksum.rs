//! Digest helpers for sequence hashes and input file checksums

use crate::error::Result;
use crate::types::ChecksumAlgorithm;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Hash an amino-acid sequence.
///
/// The sequence is upper-cased before hashing, so `"mkv"` and `"MKV"` share a
/// digest. Output is lowercase hex.
pub fn sequence_hash(sequence: &str, algorithm: ChecksumAlgorithm) -> String {
    let normalized = sequence.to_ascii_uppercase();
    match algorithm {
        ChecksumAlgorithm::Md5 => format!("{:x}", md5::compute(normalized.as_bytes())),
        ChecksumAlgorithm::Sha256 => hex::encode(Sha256::digest(normalized.as_bytes())),
    }
}

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut buffer = [0u8; 8192];

    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }
            Ok(format!("{:x}", context.compute()))
        },
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            Ok(hex::encode(hasher.finalize()))
        },
    }
}
