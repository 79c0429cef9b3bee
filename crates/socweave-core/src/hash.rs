//! Content fingerprints for handoff snapshots.
//!
//! A fingerprint covers the serialized content only, so two builds from the
//! same inputs yield the same value.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 fingerprint.
pub type Fingerprint = [u8; 32];

/// Compute the SHA-256 fingerprint of any serializable value.
pub fn fingerprint<T: Serialize>(value: &T) -> Fingerprint {
    let json = serde_json::to_vec(value).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hasher.finalize().into()
}

/// Fingerprint rendered as lowercase hex.
pub fn fingerprint_hex<T: Serialize>(value: &T) -> String {
    fingerprint(value).iter().map(|b| format!("{b:02x}")).collect()
}
