//! Content fingerprints.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the UTF-8 bytes of `text`.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
