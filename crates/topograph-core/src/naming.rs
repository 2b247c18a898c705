//! Naming policy.
//!
//! Every call site that needs a concrete resource name goes through
//! `derive_name`. This is the single place logical names turn into canonical
//! names, which eliminates drift between ad-hoc concatenation styles
//! (hyphen here, underscore there) that would otherwise let two resources
//! silently collide.
//!
//! Guarantees:
//! - pure, total, deterministic for well-formed inputs
//! - `InvalidName` for characters outside `[a-z0-9-]` or oversized names
//! - injective within one region: distinct logical names always derive
//!   distinct canonical names (the region suffix is fixed, so the mapping
//!   is suffix-preserving string identity)

use serde::{Deserialize, Serialize};

use crate::errors::{SynthError, SynthResult};
use crate::limits;
use crate::profile::Region;

/// The kind of resource being named. Bounds differ per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameKind {
    Handler,
    Surface,
}

impl NameKind {
    pub fn max_len(&self) -> usize {
        match self {
            Self::Handler => limits::MAX_HANDLER_NAME_LEN,
            Self::Surface => limits::MAX_SURFACE_NAME_LEN,
        }
    }
}

/// Validate a logical name against the allowed character class.
///
/// Logical names are lowercase ASCII letters, digits, and hyphens; they must
/// be non-empty and must not begin or end with a hyphen. Underscores and
/// uppercase are rejected rather than normalized: silent normalization is
/// how two distinct logical names end up as one physical resource.
pub fn validate_logical_name(logical: &str) -> SynthResult<()> {
    if logical.is_empty() {
        return Err(SynthError::invalid_name(logical, "name is empty"));
    }
    if let Some(c) = logical
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(SynthError::invalid_name(
            logical,
            format!("character {c:?} is outside [a-z0-9-]"),
        ));
    }
    if logical.starts_with('-') || logical.ends_with('-') {
        return Err(SynthError::invalid_name(
            logical,
            "name must not begin or end with a hyphen",
        ));
    }
    Ok(())
}

/// Derive the canonical name for a resource in a region.
///
/// Canonical form is `<logical>-<regionId>`. For a fixed region this is
/// injective over well-formed logical names.
pub fn derive_name(region: Region, kind: NameKind, logical: &str) -> SynthResult<String> {
    validate_logical_name(logical)?;

    let canonical = format!("{}-{}", logical, region.id());
    if canonical.len() > kind.max_len() {
        return Err(SynthError::invalid_name(
            logical,
            format!(
                "canonical name is {} chars, limit for this kind is {}",
                canonical.len(),
                kind.max_len()
            ),
        ));
    }
    Ok(canonical)
}
