//! Permission aggregation.
//!
//! The per-region execution identity gets exactly the grants the handlers
//! need: the union of all declared resource dependencies, resolved against
//! the region profile and deduplicated. Two handlers depending on the same
//! secret produce one grant, not two — duplicate statements with divergent
//! wording are how permission surfaces silently drift, so minimality is a
//! correctness property here, not an optimization.
//!
//! Every handler additionally receives an implicit `write-logs` grant.
//! Logging is mandatory infrastructure, not opt-in; this is the single
//! exception to "aggregation reflects only declared dependencies".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::profile::RegionProfile;
use crate::registry::{ResolvedHandler, ResourceDependency};

/// Closed set of grantable actions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionAction {
    ReadSecret,
    ReadWriteObjectStore,
    WriteLogs,
}

/// A minimal (action, resource) pair for the region's execution identity.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PermissionGrant {
    pub action: PermissionAction,
    pub resource: String,
}

/// Aggregation scope.
///
/// `SpecificOnly` is the default: grants name exactly the resources the
/// profile resolves. `WithWildcardFallback` additionally grants read on the
/// secret id's first path component plus `/*`, for operators who rotate
/// secrets under a shared prefix. The fallback widens the permission
/// surface and must be an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantScope {
    #[default]
    SpecificOnly,
    WithWildcardFallback,
}

/// Resolve an abstract dependency to its ARN-like identifier.
fn resolve_resource(dep: ResourceDependency, profile: &RegionProfile) -> PermissionGrant {
    match dep {
        ResourceDependency::Secret => PermissionGrant {
            action: PermissionAction::ReadSecret,
            resource: format!(
                "arn:secret:{}:{}",
                profile.region.cloud_region(),
                profile.secret_id
            ),
        },
        ResourceDependency::Bucket => PermissionGrant {
            action: PermissionAction::ReadWriteObjectStore,
            resource: format!("arn:bucket:{}", profile.bucket_name),
        },
    }
}

/// The region-wide log sink every handler writes to.
fn logs_grant(profile: &RegionProfile) -> PermissionGrant {
    PermissionGrant {
        action: PermissionAction::WriteLogs,
        resource: format!("arn:logs:{}:*", profile.region.cloud_region()),
    }
}

/// Wildcard secret fallback, derived from the secret id's first path
/// component (`dealsnow/db-credentials` → `dealsnow/*`).
fn wildcard_secret_grant(profile: &RegionProfile) -> PermissionGrant {
    let prefix = profile
        .secret_id
        .split('/')
        .next()
        .unwrap_or(profile.secret_id.as_str());
    PermissionGrant {
        action: PermissionAction::ReadSecret,
        resource: format!(
            "arn:secret:{}:{}/*",
            profile.region.cloud_region(),
            prefix
        ),
    }
}

/// Aggregate the grant set for a list of resolved handlers.
///
/// The result is a `BTreeSet`, so it is deduplicated and canonically
/// ordered by (action, resource) regardless of handler order. The set is
/// non-empty whenever `handlers` is non-empty (implicit `write-logs`).
pub fn aggregate(
    handlers: &[ResolvedHandler],
    profile: &RegionProfile,
    scope: GrantScope,
) -> BTreeSet<PermissionGrant> {
    let mut grants = BTreeSet::new();

    for handler in handlers {
        grants.insert(logs_grant(profile));
        for dep in &handler.resource_dependencies {
            grants.insert(resolve_resource(*dep, profile));
        }
    }

    if scope == GrantScope::WithWildcardFallback && !handlers.is_empty() {
        grants.insert(wildcard_secret_grant(profile));
    }

    grants
}
