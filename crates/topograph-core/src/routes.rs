//! Route tables and routing surfaces.
//!
//! Each region exposes two independent routing surfaces: the production API
//! and the staging/admin API. A surface is a set of (path, method) → handler
//! bindings plus surface-level policy (stage name, throttling, CORS). The
//! two surfaces are separate namespaces: the same (path, method) pair may
//! appear on both without conflict.
//!
//! Surface construction builds a trie keyed by path segment then method:
//! - a second binding on an identical (path, method) key fails the whole
//!   build with `RouteConflict`; partial surfaces are never emitted
//! - two sibling `{param}` segments with different names are one route
//!   position no gateway can disambiguate; the second also fails with
//!   `RouteConflict`
//! - a binding whose handler is absent from the registry fails with
//!   `UnknownHandler`
//! - registration order never affects the result; the finished surface is
//!   compared by (path, method) membership

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{SynthError, SynthResult};
use crate::registry::FunctionRegistry;

/// Closed HTTP verb set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment of a route path: a literal or a `{param}` placeholder.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PathSegment {
    Literal(String),
    Param(String),
}

impl PathSegment {
    /// Parse a raw segment. `{id}` becomes a parameter; anything else is a
    /// literal. Both use the `[a-z0-9-]` class, same as logical names.
    pub fn parse(raw: &str) -> SynthResult<Self> {
        if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            validate_segment_chars(inner, raw)?;
            Ok(Self::Param(inner.to_string()))
        } else {
            validate_segment_chars(raw, raw)?;
            Ok(Self::Literal(raw.to_string()))
        }
    }
}

fn validate_segment_chars(chars: &str, raw: &str) -> SynthResult<()> {
    if chars.is_empty() {
        return Err(SynthError::invalid_name(raw, "path segment is empty"));
    }
    if let Some(c) = chars
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(SynthError::invalid_name(
            raw,
            format!("path segment character {c:?} is outside [a-z0-9-]"),
        ));
    }
    Ok(())
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::Param(s) => write!(f, "{{{s}}}"),
        }
    }
}

/// An ordered sequence of path segments.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RoutePath(pub Vec<PathSegment>);

impl RoutePath {
    /// Parse a sequence of raw segments, e.g. `["products", "{id}"]`.
    pub fn parse<S: AsRef<str>>(segments: &[S]) -> SynthResult<Self> {
        let mut parsed = Vec::with_capacity(segments.len());
        for s in segments {
            parsed.push(PathSegment::parse(s.as_ref())?);
        }
        Ok(Self(parsed))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.0 {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

/// A declarative (path, method) → handler binding supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteBinding {
    pub path: RoutePath,
    pub method: HttpMethod,
    /// Reference to a `HandlerSpec` by logical name.
    pub handler: String,
}

impl RouteBinding {
    pub fn new(path: RoutePath, method: HttpMethod, handler: impl Into<String>) -> Self {
        Self {
            path,
            method,
            handler: handler.into(),
        }
    }
}

/// Which of the two per-region surfaces a binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceKind {
    Production,
    Staging,
}

impl SurfaceKind {
    /// Logical surface name fed through the naming policy.
    pub const fn logical_name(&self) -> &'static str {
        match self {
            Self::Production => "api",
            Self::Staging => "staging-api",
        }
    }
}

/// Cross-origin policy attached to a surface.
///
/// Enumerated once here instead of repeating header blocks per route, which
/// is how the headers drifted apart in the first place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsPolicy {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<HttpMethod>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec![HttpMethod::Get, HttpMethod::Post, HttpMethod::Options],
            allow_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-Api-Key".to_string(),
                "X-Country-Code".to_string(),
            ],
            allow_credentials: false,
        }
    }
}

/// Surface-level policy: stage identity, throttling, CORS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfacePolicy {
    pub stage_name: String,
    pub throttle_rate_limit: u32,
    pub throttle_burst_limit: u32,
    pub cors: CorsPolicy,
}

impl SurfacePolicy {
    pub fn production() -> Self {
        Self {
            stage_name: "prod".to_string(),
            throttle_rate_limit: 100,
            throttle_burst_limit: 50,
            cors: CorsPolicy::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            stage_name: "staging".to_string(),
            throttle_rate_limit: 10,
            throttle_burst_limit: 5,
            cors: CorsPolicy::default(),
        }
    }

    pub fn default_for(kind: SurfaceKind) -> Self {
        match kind {
            SurfaceKind::Production => Self::production(),
            SurfaceKind::Staging => Self::staging(),
        }
    }
}

/// A fully resolved route inside a finished surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRoute {
    pub path: RoutePath,
    pub method: HttpMethod,
    pub handler: String,
}

/// A finished routing surface: canonical name, policy, routes sorted by
/// (path, method). Equality is (path, method) membership because the route
/// list is always in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSurface {
    pub name: String,
    pub kind: SurfaceKind,
    pub policy: SurfacePolicy,
    pub routes: Vec<ResolvedRoute>,
}

impl RoutingSurface {
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

/// Trie node keyed by path segment, with method bindings at each node.
#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<PathSegment, TrieNode>,
    methods: BTreeMap<HttpMethod, String>,
}

impl TrieNode {
    fn flatten(&self, prefix: &mut Vec<PathSegment>, out: &mut Vec<ResolvedRoute>) {
        for (method, handler) in &self.methods {
            out.push(ResolvedRoute {
                path: RoutePath(prefix.clone()),
                method: *method,
                handler: handler.clone(),
            });
        }
        for (seg, child) in &self.children {
            prefix.push(seg.clone());
            child.flatten(prefix, out);
            prefix.pop();
        }
    }
}

/// Build one routing surface from its bindings.
///
/// `surface_name` must already be canonical (derived through the naming
/// policy by the synthesizer). The whole build fails on the first conflict
/// or dangling reference; no partial surface is emitted.
pub fn build_surface(
    surface_name: &str,
    kind: SurfaceKind,
    policy: SurfacePolicy,
    bindings: &[RouteBinding],
    registry: &FunctionRegistry,
) -> SynthResult<RoutingSurface> {
    let mut root = TrieNode::default();

    for binding in bindings {
        if !registry.contains(&binding.handler) {
            return Err(SynthError::UnknownHandler {
                surface: surface_name.to_string(),
                path: binding.path.to_string(),
                method: binding.method.to_string(),
                handler: binding.handler.clone(),
            });
        }

        let mut node = &mut root;
        for seg in binding.path.segments() {
            // A node may carry at most one parameter child. A sibling
            // parameter under a different name would occupy the same match
            // position, so the surface would contain two routes a gateway
            // cannot tell apart.
            if let PathSegment::Param(name) = seg {
                let ambiguous = node
                    .children
                    .keys()
                    .any(|k| matches!(k, PathSegment::Param(existing) if existing != name));
                if ambiguous {
                    return Err(SynthError::RouteConflict {
                        surface: surface_name.to_string(),
                        path: binding.path.to_string(),
                        method: binding.method.to_string(),
                    });
                }
            }
            node = node.children.entry(seg.clone()).or_default();
        }

        if node.methods.contains_key(&binding.method) {
            return Err(SynthError::RouteConflict {
                surface: surface_name.to_string(),
                path: binding.path.to_string(),
                method: binding.method.to_string(),
            });
        }
        node.methods.insert(binding.method, binding.handler.clone());
    }

    // Trie traversal in BTreeMap order yields routes sorted by
    // (path, method) independent of binding order.
    let mut routes = Vec::with_capacity(bindings.len());
    root.flatten(&mut Vec::new(), &mut routes);
    crate::determinism::stable_sort_by_key(&mut routes, |r| (r.path.clone(), r.method));

    Ok(RoutingSurface {
        name: surface_name.to_string(),
        kind,
        policy,
        routes,
    })
}
