//! Error types for topograph-core.
//!
//! One enum covers every failure the synthesizer can surface. Each variant
//! carries the offending identifier so callers can localize the fix without
//! inspecting internals. Nothing is recovered inside the core: synthesis is
//! deterministic and side-effect-free, so retrying with unchanged input is
//! pointless and every error is surfaced verbatim.

use thiserror::Error;

/// Crate-wide result alias.
pub type SynthResult<T> = Result<T, SynthError>;

/// All errors surfaced by topology synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    /// A logical name violates the naming policy.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A route binding references a handler absent from the registry.
    #[error("route {path} {method} on surface {surface:?} references unknown handler {handler:?}")]
    UnknownHandler {
        surface: String,
        path: String,
        method: String,
        handler: String,
    },

    /// Two bindings on the same surface share a (path, method) key.
    #[error("route conflict on surface {surface:?}: {path} {method} is already bound")]
    RouteConflict {
        surface: String,
        path: String,
        method: String,
    },

    /// Handler sizing falls outside the supported platform tiers.
    #[error("invalid sizing for handler {handler:?}: {field} = {value} is not supported")]
    InvalidResourceSizing {
        handler: String,
        field: &'static str,
        value: u32,
    },

    /// A second handler was registered under an existing logical name.
    #[error("handler {name:?} is already registered")]
    DuplicateHandler { name: String },

    /// `synthesize()` was called on an already sealed synthesizer.
    #[error("synthesizer is sealed; create a fresh instance per synthesis run")]
    AlreadySealed,

    /// An internal invariant was broken. Reaching this is a bug.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl SynthError {
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_offending_identifiers() {
        let e = SynthError::invalid_name("Bad_Name", "contains characters outside [a-z0-9-]");
        assert!(e.to_string().contains("Bad_Name"));

        let e = SynthError::RouteConflict {
            surface: "prod".to_string(),
            path: "/products".to_string(),
            method: "GET".to_string(),
        };
        assert!(e.to_string().contains("/products"));
        assert!(e.to_string().contains("GET"));
    }
}
