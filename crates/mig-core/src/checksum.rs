//! SHA-256 checksums for content-addressed schema snapshots.

use sha2::{Digest, Sha256};

/// Compute the hex SHA-256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}
