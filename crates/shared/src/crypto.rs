//! Cryptographic utilities for passcode hashing and comparison.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two secrets by their SHA-256 digests.
///
/// Both sides are hashed before comparison, so the comparison itself always
/// operates on fixed-length values.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    sha256_hex(presented) == sha256_hex(expected)
}
