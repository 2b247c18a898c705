//! Deterministic hashing for sealed graphs.
//!
//! Graph digests are:
//! - deterministic
//! - domain-separated
//! - computed over canonical JSON bytes
//!
//! Canonical bytes come from `serde_json::to_vec` over structures whose maps
//! are all `BTreeMap`/`BTreeSet` and whose vectors are pre-sorted. Struct
//! fields serialize in declaration order, so the encoding is stable across
//! runs and platforms. Hashable bytes must never come from unordered maps.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::{SynthError, SynthResult};

/// Serialize a value to canonical JSON bytes.
///
/// The caller is responsible for the value being canonically ordered
/// (BTree maps, sorted vectors). See module docs.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> SynthResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| SynthError::invariant(format!("canonical serialization failed: {e}")))
}

/// Hash canonical bytes with a domain separation label, lowercase hex output.
pub fn hash_with_domain_hex(domain: &str, bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(domain.as_bytes());
    h.update(bytes);
    hex::encode(h.finalize())
}
