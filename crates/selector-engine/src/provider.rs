//! Test-friendly and embedding-friendly implementations of the
//! `selector-core` provider contracts. A real Yahoo Range HTTP client is
//! transport, which this crate leaves to embedders — the only
//! `RangeProvider` shipped here is a fixed in-memory map.

use selector_core::{RangeProvider, Subject};
use std::collections::HashMap;

/// A `RangeProvider` backed by a fixed `expr -> [fqdn]` map, for tests and
/// for embedders that resolve ranges through their own means before the
/// engine ever sees them.
#[derive(Debug, Default, Clone)]
pub struct StaticRangeProvider {
    ranges: HashMap<String, Vec<String>>,
}

impl StaticRangeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, expr: impl Into<String>, hosts: impl IntoIterator<Item = String>) -> Self {
        self.ranges.insert(expr.into(), hosts.into_iter().collect());
        self
    }
}

impl RangeProvider for StaticRangeProvider {
    fn get(&self, expr: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        self.ranges
            .get(expr)
            .cloned()
            .ok_or_else(|| format!("range `{expr}` is not defined").into())
    }
}

/// Where `filter` gets its candidate pool from — orthogonal to the engine
/// itself, so embedders can back it with a live node inventory, a static
/// fixture, or anything else.
pub trait SubjectSource {
    fn subjects(&self) -> Vec<Subject>;
}

impl SubjectSource for Vec<Subject> {
    fn subjects(&self) -> Vec<Subject> {
        self.clone()
    }
}

impl SubjectSource for [Subject] {
    fn subjects(&self) -> Vec<Subject> {
        self.to_vec()
    }
}
