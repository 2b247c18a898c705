//! Determinism utilities for topograph.
//!
//! Synthesis output must be safe to diff: the same inputs, in any
//! registration order, must produce byte-identical canonical bytes. These
//! modules make the ordering and hashing rules explicit and auditable
//! instead of relying on incidental iteration order.

pub mod hashing;
pub mod stable_sort;

pub use hashing::{canonical_json_bytes, hash_with_domain_hex};
pub use stable_sort::{ensure_sorted, stable_sort_by_key};
