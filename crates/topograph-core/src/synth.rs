//! Topology synthesis orchestration.
//!
//! `TopologySynthesizer` is the one entry point that turns a region profile,
//! a set of handler specs, and two sets of route bindings into a sealed
//! `TopologyGraph`. It is a small state machine:
//!
//! - `Building`: handlers and bindings are accepted incrementally; no
//!   invariants are enforced yet
//! - validation runs inside `synthesize()`: naming derivation, registry
//!   resolution, permission aggregation, then both route-table builds, in
//!   that order; any failure aborts the run and the synthesizer stays in
//!   `Building` so the caller can fix input and retry
//! - `Sealed`: on success the graph is frozen and returned; further
//!   mutation and a second `synthesize()` fail with `AlreadySealed`
//!
//! Synthesis is one-shot per instance; callers create a fresh synthesizer
//! per region. There is no I/O anywhere on this path: the same inputs, in
//! any registration order, produce an equal graph with the same canonical
//! digest, which is what makes repeated synthesis safe to diff.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::determinism::{canonical_json_bytes, ensure_sorted, hash_with_domain_hex};
use crate::errors::{SynthError, SynthResult};
use crate::export::ExportTable;
use crate::naming::{self, NameKind};
use crate::permissions::{self, GrantScope, PermissionGrant};
use crate::profile::{self, RegionProfile};
use crate::registry::{FunctionRegistry, HandlerSpec, ResolvedHandler};
use crate::routes::{
    self, RouteBinding, RoutingSurface, SurfaceKind, SurfacePolicy,
};
use crate::{domain, GRAPH_VERSION_V1};

/// Logical name of the per-region execution identity.
const PRINCIPAL_LOGICAL_NAME: &str = "exec-role";

/// Logical names the synthesizer derives for its own resources. A handler
/// registered under one of these would share a canonical name with the
/// principal or a surface, and the provisioner would silently create two
/// resources under one name.
const RESERVED_LOGICAL_NAMES: [&str; 3] = [
    PRINCIPAL_LOGICAL_NAME,
    SurfaceKind::Production.logical_name(),
    SurfaceKind::Staging.logical_name(),
];

/// The complete synthesis output.
///
/// Constructed once per invocation, immutable, consumed by the external
/// provisioning collaborator. Every collection is canonically ordered, so
/// two graphs synthesized from the same inputs compare equal with `==`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub version: String,
    pub profile: RegionProfile,
    /// Resolved handlers, sorted by canonical name.
    pub handlers: Vec<ResolvedHandler>,
    pub production: RoutingSurface,
    pub staging: RoutingSurface,
    /// Deduplicated grant set, ordered by (action, resource).
    pub grants: BTreeSet<PermissionGrant>,
    /// Canonical name of the execution identity the grants attach to.
    pub principal: String,
    pub exports: ExportTable,
}

impl TopologyGraph {
    /// Domain-separated digest over the graph's canonical JSON bytes.
    ///
    /// Equal graphs always produce equal digests; downstream diffing
    /// compares these to skip redeploys.
    pub fn canonical_digest_hex(&self) -> SynthResult<String> {
        let bytes = canonical_json_bytes(self)?;
        Ok(hash_with_domain_hex(domain::TOPOLOGY, &bytes))
    }
}

/// A structured diagnostic emitted during synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthDiagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
}

/// Counts for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthStats {
    pub handlers: usize,
    pub production_routes: usize,
    pub staging_routes: usize,
    pub grants: usize,
}

/// Synthesis result: the sealed graph plus its digest, diagnostics, stats.
#[derive(Debug, Clone)]
pub struct SynthReport {
    pub graph: TopologyGraph,
    pub digest_hex: String,
    pub diagnostics: Vec<SynthDiagnostic>,
    pub stats: SynthStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Building,
    Sealed,
}

/// One-shot synthesizer for a single region.
#[derive(Debug)]
pub struct TopologySynthesizer {
    profile: RegionProfile,
    registry: FunctionRegistry,
    production_bindings: Vec<RouteBinding>,
    staging_bindings: Vec<RouteBinding>,
    production_policy: SurfacePolicy,
    staging_policy: SurfacePolicy,
    grant_scope: GrantScope,
    state: State,
}

impl TopologySynthesizer {
    /// Create a fresh synthesizer owning its own registry and bindings.
    pub fn new(profile: RegionProfile) -> Self {
        Self {
            profile,
            registry: FunctionRegistry::new(),
            production_bindings: Vec::new(),
            staging_bindings: Vec::new(),
            production_policy: SurfacePolicy::production(),
            staging_policy: SurfacePolicy::staging(),
            grant_scope: GrantScope::default(),
            state: State::Building,
        }
    }

    pub fn profile(&self) -> &RegionProfile {
        &self.profile
    }

    fn check_building(&self) -> SynthResult<()> {
        match self.state {
            State::Building => Ok(()),
            State::Sealed => Err(SynthError::AlreadySealed),
        }
    }

    /// Register a handler spec.
    ///
    /// Duplicate logical names are rejected here, as are the logical names
    /// reserved for synthesizer-owned resources (the execution identity and
    /// the two surfaces).
    pub fn register_handler(&mut self, spec: HandlerSpec) -> SynthResult<()> {
        self.check_building()?;
        if RESERVED_LOGICAL_NAMES.contains(&spec.logical_name.as_str()) {
            return Err(SynthError::invalid_name(
                spec.logical_name.as_str(),
                "name is reserved for a synthesizer-owned resource",
            ));
        }
        self.registry.register(spec)
    }

    /// Bind a route onto one of the two surfaces.
    ///
    /// No validation happens here beyond the sealed check; conflicts and
    /// dangling references surface during `synthesize()`.
    pub fn bind_route(&mut self, surface: SurfaceKind, binding: RouteBinding) -> SynthResult<()> {
        self.check_building()?;
        match surface {
            SurfaceKind::Production => self.production_bindings.push(binding),
            SurfaceKind::Staging => self.staging_bindings.push(binding),
        }
        Ok(())
    }

    /// Replace the policy attached to a surface.
    pub fn set_surface_policy(
        &mut self,
        surface: SurfaceKind,
        policy: SurfacePolicy,
    ) -> SynthResult<()> {
        self.check_building()?;
        match surface {
            SurfaceKind::Production => self.production_policy = policy,
            SurfaceKind::Staging => self.staging_policy = policy,
        }
        Ok(())
    }

    /// Opt in to the wildcard secret fallback grant.
    pub fn set_grant_scope(&mut self, scope: GrantScope) -> SynthResult<()> {
        self.check_building()?;
        self.grant_scope = scope;
        Ok(())
    }

    /// Run the full synthesis and seal the instance.
    ///
    /// Any failure leaves the synthesizer in `Building` with no partial
    /// graph visible; the caller may correct input and call again. After a
    /// success, every further call fails with `AlreadySealed`.
    pub fn synthesize(&mut self) -> SynthResult<SynthReport> {
        self.check_building()?;

        let mut diagnostics = Vec::new();
        let mut push = |level: DiagnosticLevel, code: &str, message: String| {
            debug!(code, %message, "synth stage");
            diagnostics.push(SynthDiagnostic {
                level,
                code: code.to_string(),
                message,
            });
        };

        profile::validate_profile(&self.profile)?;
        let region = self.profile.region;

        // Naming derivation for the fixed resources. Handler names derive
        // inside registry resolution below, through the same policy.
        let production_name = naming::derive_name(
            region,
            NameKind::Surface,
            SurfaceKind::Production.logical_name(),
        )?;
        let staging_name = naming::derive_name(
            region,
            NameKind::Surface,
            SurfaceKind::Staging.logical_name(),
        )?;
        let principal = naming::derive_name(region, NameKind::Handler, PRINCIPAL_LOGICAL_NAME)?;
        push(
            DiagnosticLevel::Info,
            "synth.naming",
            format!("derived names for region {}", region.id()),
        );

        // Registry resolution: baseline env overlay + sizing validation.
        let baseline_env = self.profile.baseline_env();
        let handlers = self.registry.resolve_all(region, &baseline_env)?;
        if handlers.is_empty() {
            push(
                DiagnosticLevel::Warning,
                "synth.registry.empty",
                "no handlers registered; surfaces and grants will be empty".to_string(),
            );
        } else {
            push(
                DiagnosticLevel::Info,
                "synth.registry",
                format!("resolved {} handlers", handlers.len()),
            );
        }

        // Permission aggregation over the resolved handlers.
        let grants = permissions::aggregate(&handlers, &self.profile, self.grant_scope);
        push(
            DiagnosticLevel::Info,
            "synth.permissions",
            format!("aggregated {} grants", grants.len()),
        );

        // Both route-table builds. Either failure aborts the whole run.
        let production = routes::build_surface(
            &production_name,
            SurfaceKind::Production,
            self.production_policy.clone(),
            &self.production_bindings,
            &self.registry,
        )?;
        let staging = routes::build_surface(
            &staging_name,
            SurfaceKind::Staging,
            self.staging_policy.clone(),
            &self.staging_bindings,
            &self.registry,
        )?;
        push(
            DiagnosticLevel::Info,
            "synth.routes",
            format!(
                "built surfaces: production={} staging={}",
                production.route_count(),
                staging.route_count()
            ),
        );
        for surface in [&production, &staging] {
            if surface.route_count() == 0 {
                push(
                    DiagnosticLevel::Warning,
                    "synth.routes.empty",
                    format!("surface {} has no routes", surface.name),
                );
            }
        }

        // Canonical ordering invariants hold before the graph is frozen.
        ensure_sorted(&handlers, |h| h.canonical_name.clone())?;
        ensure_sorted(&production.routes, |r| (r.path.clone(), r.method))?;
        ensure_sorted(&staging.routes, |r| (r.path.clone(), r.method))?;

        let mut exports = ExportTable::new();
        let rid = region.id();
        exports.insert(
            format!("api-base-{rid}"),
            format!("ref:surface:{production_name}"),
        );
        exports.insert(
            format!("staging-api-base-{rid}"),
            format!("ref:surface:{staging_name}"),
        );
        exports.insert(format!("bucket-{rid}"), self.profile.bucket_name.clone());
        exports.insert(format!("principal-{rid}"), principal.clone());

        let stats = SynthStats {
            handlers: handlers.len(),
            production_routes: production.route_count(),
            staging_routes: staging.route_count(),
            grants: grants.len(),
        };

        let graph = TopologyGraph {
            version: GRAPH_VERSION_V1.to_string(),
            profile: self.profile.clone(),
            handlers,
            production,
            staging,
            grants,
            principal,
            exports,
        };

        let digest_hex = graph.canonical_digest_hex()?;
        push(
            DiagnosticLevel::Info,
            "synth.sealed",
            format!("graph digest {digest_hex}"),
        );

        self.state = State::Sealed;

        Ok(SynthReport {
            graph,
            digest_hex,
            diagnostics,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Region;
    use crate::registry::ResourceDependency;
    use crate::routes::{HttpMethod, RoutePath};
    use assert_matches::assert_matches;

    fn profile() -> RegionProfile {
        RegionProfile::new(
            Region::UsEast2,
            "dealsnow",
            "dealsnow/db-credentials",
            "dealsnow-data",
        )
    }

    fn path(segments: &[&str]) -> RoutePath {
        RoutePath::parse(segments).unwrap()
    }

    fn populated() -> TopologySynthesizer {
        let mut synth = TopologySynthesizer::new(profile());
        synth
            .register_handler(
                HandlerSpec::new("product-search", "product_search.handler", 30, 512)
                    .depends_on(ResourceDependency::Secret),
            )
            .unwrap();
        synth
            .register_handler(
                HandlerSpec::new("manage-users", "manage_users.handler", 30, 512)
                    .depends_on(ResourceDependency::Secret),
            )
            .unwrap();
        synth
            .bind_route(
                SurfaceKind::Production,
                RouteBinding::new(path(&["products"]), HttpMethod::Get, "product-search"),
            )
            .unwrap();
        synth
            .bind_route(
                SurfaceKind::Staging,
                RouteBinding::new(path(&["users"]), HttpMethod::Post, "manage-users"),
            )
            .unwrap();
        synth
    }

    #[test]
    fn synthesize_seals_and_is_one_shot() {
        let mut synth = populated();
        let report = synth.synthesize().unwrap();
        assert_eq!(report.stats.handlers, 2);

        // The first graph remains valid and unchanged.
        let digest_again = report.graph.canonical_digest_hex().unwrap();
        assert_eq!(digest_again, report.digest_hex);

        assert_matches!(synth.synthesize(), Err(SynthError::AlreadySealed));
        assert_matches!(
            synth.register_handler(HandlerSpec::new("late", "late.handler", 5, 128)),
            Err(SynthError::AlreadySealed)
        );
        assert_matches!(
            synth.bind_route(
                SurfaceKind::Production,
                RouteBinding::new(RoutePath(vec![]), HttpMethod::Get, "late"),
            ),
            Err(SynthError::AlreadySealed)
        );
    }

    #[test]
    fn failure_leaves_builder_usable() {
        let mut synth = populated();
        // Dangling reference: no such handler registered.
        synth
            .bind_route(
                SurfaceKind::Production,
                RouteBinding::new(path(&["bookmarks"]), HttpMethod::Get, "bookmark-management"),
            )
            .unwrap();

        assert_matches!(
            synth.synthesize(),
            Err(SynthError::UnknownHandler { handler, .. }) if handler == "bookmark-management"
        );

        // Still in Building: register the missing handler and retry.
        synth
            .register_handler(HandlerSpec::new(
                "bookmark-management",
                "bookmark_management.handler",
                30,
                512,
            ))
            .unwrap();
        let report = synth.synthesize().unwrap();
        assert_eq!(report.stats.handlers, 3);
    }

    #[test]
    fn same_path_method_on_both_surfaces_is_fine() {
        let mut synth = populated();
        synth
            .bind_route(
                SurfaceKind::Staging,
                RouteBinding::new(path(&["products"]), HttpMethod::Get, "product-search"),
            )
            .unwrap();
        let report = synth.synthesize().unwrap();
        assert_eq!(report.stats.production_routes, 1);
        assert_eq!(report.stats.staging_routes, 2);
    }

    #[test]
    fn exports_embed_region_id() {
        let mut synth = populated();
        let report = synth.synthesize().unwrap();
        let exports = &report.graph.exports;
        assert_eq!(exports.get("api-base-us"), Some("ref:surface:api-us"));
        assert_eq!(
            exports.get("staging-api-base-us"),
            Some("ref:surface:staging-api-us")
        );
        assert_eq!(exports.get("bucket-us"), Some("dealsnow-data"));
        assert_eq!(exports.get("principal-us"), Some("exec-role-us"));
        assert_eq!(exports.len(), 4);
    }

    #[test]
    fn registration_order_never_leaks() {
        let mut a = TopologySynthesizer::new(profile());
        let mut b = TopologySynthesizer::new(profile());

        let specs = [
            HandlerSpec::new("product-search", "product_search.handler", 30, 512)
                .depends_on(ResourceDependency::Secret),
            HandlerSpec::new("manage-users", "manage_users.handler", 30, 512)
                .depends_on(ResourceDependency::Secret),
            HandlerSpec::new("dump-products", "dump_products.handler", 300, 1024)
                .depends_on(ResourceDependency::Bucket),
        ];
        let bindings = [
            RouteBinding::new(path(&["products"]), HttpMethod::Get, "product-search"),
            RouteBinding::new(path(&["products"]), HttpMethod::Post, "manage-users"),
            RouteBinding::new(path(&["dump"]), HttpMethod::Post, "dump-products"),
        ];

        for spec in specs.iter() {
            a.register_handler(spec.clone()).unwrap();
        }
        for binding in bindings.iter() {
            a.bind_route(SurfaceKind::Production, binding.clone()).unwrap();
        }

        for spec in specs.iter().rev() {
            b.register_handler(spec.clone()).unwrap();
        }
        for binding in bindings.iter().rev() {
            b.bind_route(SurfaceKind::Production, binding.clone()).unwrap();
        }

        let ra = a.synthesize().unwrap();
        let rb = b.synthesize().unwrap();
        assert_eq!(ra.graph, rb.graph);
        assert_eq!(ra.digest_hex, rb.digest_hex);
    }

    #[test]
    fn reserved_logical_names_rejected() {
        let mut synth = TopologySynthesizer::new(profile());
        for name in ["exec-role", "api", "staging-api"] {
            let err = synth
                .register_handler(HandlerSpec::new(name, "x.handler", 5, 128))
                .unwrap_err();
            assert_matches!(err, SynthError::InvalidName { name: n, .. } if n == name);
        }

        // The graph can never carry a handler shadowing the principal or a
        // surface name.
        synth
            .register_handler(HandlerSpec::new("product-search", "ps.handler", 30, 512))
            .unwrap();
        let report = synth.synthesize().unwrap();
        for h in &report.graph.handlers {
            assert_ne!(h.canonical_name, report.graph.principal);
            assert_ne!(h.canonical_name, report.graph.production.name);
            assert_ne!(h.canonical_name, report.graph.staging.name);
        }
    }

    #[test]
    fn sibling_params_conflict_at_synthesis() {
        let mut synth = populated();
        synth
            .bind_route(
                SurfaceKind::Production,
                RouteBinding::new(
                    path(&["products", "{id}"]),
                    HttpMethod::Get,
                    "product-search",
                ),
            )
            .unwrap();
        synth
            .bind_route(
                SurfaceKind::Production,
                RouteBinding::new(
                    path(&["products", "{slug}"]),
                    HttpMethod::Get,
                    "manage-users",
                ),
            )
            .unwrap();
        assert_matches!(
            synth.synthesize(),
            Err(SynthError::RouteConflict { path, .. }) if path == "/products/{slug}"
        );
    }

    #[test]
    fn empty_inputs_synthesize_with_warnings() {
        let mut synth = TopologySynthesizer::new(profile());
        let report = synth.synthesize().unwrap();
        assert_eq!(report.stats.handlers, 0);
        assert!(report.graph.grants.is_empty());

        let warnings: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| matches!(d.level, DiagnosticLevel::Warning))
            .map(|d| d.code.as_str())
            .collect();
        assert!(warnings.contains(&"synth.registry.empty"));
        assert!(warnings.contains(&"synth.routes.empty"));
    }

    #[test]
    fn populated_synthesis_emits_no_warnings() {
        let mut synth = populated();
        let report = synth.synthesize().unwrap();
        assert!(!report
            .diagnostics
            .iter()
            .any(|d| matches!(d.level, DiagnosticLevel::Warning)));
    }

    #[test]
    fn sizing_error_aborts_whole_run() {
        let mut synth = TopologySynthesizer::new(profile());
        synth
            .register_handler(HandlerSpec::new("oversized", "o.handler", 30, 333))
            .unwrap();
        assert_matches!(
            synth.synthesize(),
            Err(SynthError::InvalidResourceSizing { value: 333, .. })
        );
    }

    #[test]
    fn regions_synthesize_independently() {
        let us = profile();
        let india = RegionProfile::new(
            Region::ApSouth1,
            "dealsnow",
            "dealsnow-india/db-credentials",
            "dealsnow-india",
        );

        let mut a = TopologySynthesizer::new(us);
        let mut b = TopologySynthesizer::new(india);
        for synth in [&mut a, &mut b] {
            synth
                .register_handler(HandlerSpec::new("product-search", "ps.handler", 30, 512))
                .unwrap();
        }

        let ra = a.synthesize().unwrap();
        let rb = b.synthesize().unwrap();
        assert_eq!(ra.graph.handlers[0].canonical_name, "product-search-us");
        assert_eq!(rb.graph.handlers[0].canonical_name, "product-search-in");
        assert_ne!(ra.digest_hex, rb.digest_hex);
    }
}
