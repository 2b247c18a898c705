//! topograph-core
//!
//! Core primitives for topograph:
//! - Region profiles (closed region set, per-region configuration)
//! - Naming policy (single source of canonical resource names)
//! - Function registry (handler specs + baseline environment resolution)
//! - Route tables (two independent routing surfaces, conflict detection)
//! - Permission aggregation (minimal dedup grant sets)
//! - Topology synthesis (one-shot sealed, canonically ordered graphs)
//!
//! The core crate performs no filesystem or network I/O. Synthesis is a pure
//! computation: the same inputs always produce an equal graph with the same
//! canonical digest, regardless of registration order. Provisioning the graph
//! into real infrastructure is the job of external collaborators.

pub mod determinism;
pub mod errors;
pub mod export;
pub mod naming;
pub mod permissions;
pub mod profile;
pub mod registry;
pub mod routes;
pub mod synth;

pub use crate::errors::{SynthError, SynthResult};

/// Graph format version string.
pub const GRAPH_VERSION_V1: &str = "v1";

/// Default domain separation labels for graph hashing.
/// These must remain stable across versions.
pub mod domain {
    pub const TOPOLOGY: &str = "topograph.v1.topology";
}

/// Platform sizing bounds for compute handlers.
pub mod limits {
    /// Inclusive handler timeout bounds, in seconds.
    pub const MIN_TIMEOUT_SECONDS: u32 = 1;
    pub const MAX_TIMEOUT_SECONDS: u32 = 900;

    /// Supported handler memory tiers, in MB.
    pub const MEMORY_TIERS_MB: &[u32] = &[128, 256, 512, 1024, 2048, 3072, 4096, 8192, 10240];

    /// Canonical name length bounds per resource kind.
    pub const MAX_HANDLER_NAME_LEN: usize = 64;
    pub const MAX_SURFACE_NAME_LEN: usize = 128;
}

/// Environment keys shared by every handler baseline.
pub mod env_keys {
    pub const DB_SECRET_NAME: &str = "DB_SECRET_NAME";
    pub const SCHEMA: &str = "SCHEMA";
    pub const COUNTRY: &str = "COUNTRY";
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::export::ExportTable;
    pub use crate::naming::{derive_name, NameKind};
    pub use crate::permissions::{GrantScope, PermissionAction, PermissionGrant};
    pub use crate::profile::{Region, RegionProfile};
    pub use crate::registry::{FunctionRegistry, HandlerSpec, ResolvedHandler, ResourceDependency};
    pub use crate::routes::{
        CorsPolicy, HttpMethod, RouteBinding, RoutePath, RoutingSurface, SurfaceKind,
        SurfacePolicy,
    };
    pub use crate::synth::{SynthReport, TopologyGraph, TopologySynthesizer};
    pub use crate::{SynthError, SynthResult};
}
