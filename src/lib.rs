//! `selector` - a fleet target-selection engine.
//!
//! This is the root crate; it just re-exports the workspace's component
//! crates so embedders can depend on a single package.

pub use selector_core as core;
pub use selector_engine as engine;
pub use selector_parse as parse;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
