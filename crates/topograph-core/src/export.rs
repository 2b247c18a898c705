//! Export tables.
//!
//! A sealed graph carries a flat string map of its externally interesting
//! values, keyed `<resource>-<regionId>`. Downstream consumers (the
//! provisioning engine, other regions' tooling) read these instead of
//! reaching into the graph structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat key/value emission of synthesis results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable(BTreeMap<String, String>);

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in deterministic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
