//! Loads `Subject` fixtures from the JSON shape `selector_core::Subject`
//! derives `Deserialize` for: `id`, `fqdn`, `ipv4`, `grains`, `pillar`,
//! `data`. `functions` can't come from a fixture file — it only exists for
//! subjects an embedder constructs directly in Rust.

use anyhow::{Context, Result};
use selector_core::Subject;
use std::fs;
use std::path::Path;

pub fn load_many(path: &Path) -> Result<Vec<Subject>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing subject fixtures from {}", path.display()))
}

pub fn load_one(path: &Path) -> Result<Subject> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing subject fixture from {}", path.display()))
}
