//! Stable sorting helpers for canonical graph ordering.
//!
//! All collections inside a sealed graph are sorted before emission:
//! - handlers by canonical name
//! - routes by (path, method)
//! - grants by (action, resource)
//!
//! These helpers keep the ordering rules visible and avoid ad-hoc sorts at
//! call sites. They avoid HashMap iteration and platform-dependent ordering.

use crate::errors::{SynthError, SynthResult};

/// Sort a slice by a key extractor, stably and deterministically.
///
/// `slice::sort_by` is stable, so equal keys keep their relative order.
pub fn stable_sort_by_key<T, K, F>(items: &mut [T], mut key_fn: F)
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    items.sort_by(|a, b| key_fn(a).cmp(&key_fn(b)));
}

/// Ensure a slice is already sorted by a key extractor.
///
/// Sealed graphs assert this before hashing: a graph that reaches the
/// digest step unsorted indicates an internal bug.
pub fn ensure_sorted<T, K, F>(items: &[T], mut key_fn: F) -> SynthResult<()>
where
    F: FnMut(&T) -> K,
    K: Ord,
{
    for w in items.windows(2) {
        if key_fn(&w[0]) > key_fn(&w[1]) {
            return Err(SynthError::invariant(
                "collection is not sorted deterministically",
            ));
        }
    }
    Ok(())
}
