//! Function registry.
//!
//! The registry stores canonical handler specifications and resolves them
//! against the shared per-region environment baseline.
//!
//! Requirements:
//! - stable ordering for lookups and iteration (BTreeMap-backed; insertion
//!   order never leaks into resolution output)
//! - logical names are unique across the whole registry
//! - no global mutable state
//!
//! The registry never executes handler code; entrypoints are opaque strings
//! the external provisioning collaborator interprets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{SynthError, SynthResult};
use crate::limits;
use crate::naming::{self, NameKind};
use crate::profile::Region;

/// An abstract resource a handler depends on.
///
/// Resolution to a concrete identifier happens in permission aggregation,
/// against the region profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceDependency {
    /// The per-region database credential secret.
    Secret,
    /// The per-region object store bucket.
    Bucket,
}

/// Declarative description of one compute unit.
///
/// Created at registry-build time, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSpec {
    /// Unique logical name within the registry, `[a-z0-9-]`.
    pub logical_name: String,

    /// Opaque reference to external handler code.
    pub entrypoint: String,

    /// Timeout in seconds, within platform bounds.
    pub timeout_seconds: u32,

    /// Memory in MB, one of the supported tiers.
    pub memory_mb: u32,

    /// Per-handler environment overlaid on the baseline. On key collision
    /// the handler's value wins.
    pub extra_env: BTreeMap<String, String>,

    /// Abstract resource references this handler needs at runtime.
    pub resource_dependencies: BTreeSet<ResourceDependency>,
}

impl HandlerSpec {
    pub fn new(
        logical_name: impl Into<String>,
        entrypoint: impl Into<String>,
        timeout_seconds: u32,
        memory_mb: u32,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            entrypoint: entrypoint.into(),
            timeout_seconds,
            memory_mb,
            extra_env: BTreeMap::new(),
            resource_dependencies: BTreeSet::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, dep: ResourceDependency) -> Self {
        self.resource_dependencies.insert(dep);
        self
    }
}

/// A handler with naming, sizing, and environment fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHandler {
    pub logical_name: String,
    pub canonical_name: String,
    pub entrypoint: String,
    pub timeout_seconds: u32,
    pub memory_mb: u32,
    /// Baseline environment overlaid by the spec's `extra_env`.
    pub env: BTreeMap<String, String>,
    pub resource_dependencies: BTreeSet<ResourceDependency>,
}

/// A registry of handler specs keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    handlers: BTreeMap<String, HandlerSpec>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Register a handler spec.
    ///
    /// The logical name is validated eagerly so malformed names fail at the
    /// registration site, not deep inside synthesis. Duplicate logical names
    /// are rejected; registration order does not affect resolution because
    /// the store is a `BTreeMap`.
    pub fn register(&mut self, spec: HandlerSpec) -> SynthResult<()> {
        naming::validate_logical_name(&spec.logical_name)?;
        if self.handlers.contains_key(&spec.logical_name) {
            return Err(SynthError::DuplicateHandler {
                name: spec.logical_name,
            });
        }
        self.handlers.insert(spec.logical_name.clone(), spec);
        Ok(())
    }

    /// Look up a spec by logical name.
    pub fn get(&self, logical_name: &str) -> Option<&HandlerSpec> {
        self.handlers.get(logical_name)
    }

    /// True if a handler with this logical name is registered.
    pub fn contains(&self, logical_name: &str) -> bool {
        self.handlers.contains_key(logical_name)
    }

    /// Iterate specs in deterministic logical-name order.
    pub fn iter(&self) -> impl Iterator<Item = &HandlerSpec> {
        self.handlers.values()
    }

    /// Resolve one spec against the baseline environment for a region.
    ///
    /// Merge policy: baseline overlaid by `extra_env`; on collision the
    /// handler's explicit value wins (the more specific setting governs).
    pub fn resolve(
        spec: &HandlerSpec,
        region: Region,
        baseline_env: &BTreeMap<String, String>,
    ) -> SynthResult<ResolvedHandler> {
        validate_sizing(spec)?;

        let canonical_name = naming::derive_name(region, NameKind::Handler, &spec.logical_name)?;

        let mut env = baseline_env.clone();
        for (k, v) in &spec.extra_env {
            env.insert(k.clone(), v.clone());
        }

        Ok(ResolvedHandler {
            logical_name: spec.logical_name.clone(),
            canonical_name,
            entrypoint: spec.entrypoint.clone(),
            timeout_seconds: spec.timeout_seconds,
            memory_mb: spec.memory_mb,
            env,
            resource_dependencies: spec.resource_dependencies.clone(),
        })
    }

    /// Resolve every spec, in canonical order.
    ///
    /// Output is sorted by canonical name. Any sizing or naming failure
    /// aborts the whole resolution.
    pub fn resolve_all(
        &self,
        region: Region,
        baseline_env: &BTreeMap<String, String>,
    ) -> SynthResult<Vec<ResolvedHandler>> {
        let mut resolved = Vec::with_capacity(self.handlers.len());
        for spec in self.handlers.values() {
            resolved.push(Self::resolve(spec, region, baseline_env)?);
        }
        // BTreeMap order is logical-name order; canonical names share the
        // region suffix, so this sort is a no-op kept for the invariant.
        crate::determinism::stable_sort_by_key(&mut resolved, |h| h.canonical_name.clone());
        Ok(resolved)
    }
}

/// Check timeout and memory against the platform bounds.
fn validate_sizing(spec: &HandlerSpec) -> SynthResult<()> {
    if spec.timeout_seconds < limits::MIN_TIMEOUT_SECONDS
        || spec.timeout_seconds > limits::MAX_TIMEOUT_SECONDS
    {
        return Err(SynthError::InvalidResourceSizing {
            handler: spec.logical_name.clone(),
            field: "timeout_seconds",
            value: spec.timeout_seconds,
        });
    }
    if !limits::MEMORY_TIERS_MB.contains(&spec.memory_mb) {
        return Err(SynthError::InvalidResourceSizing {
            handler: spec.logical_name.clone(),
            field: "memory_mb",
            value: spec.memory_mb,
        });
    }
    Ok(())
}
