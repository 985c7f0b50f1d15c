//! Binds the selector grammar to concrete rule kinds: the evaluator
//! registry (prefix/shortcut dispatch, macro expansion, `querify`
//! serialization), configuration loading, and the provider
//! implementations an embedder needs to actually run a `filter`/`match`.

pub mod config;
pub mod error;
pub mod options;
pub mod provider;
pub mod querify;
pub mod registry;

pub use error::{EngineError, Result};
pub use options::{Options, RuleKind};
pub use provider::{StaticRangeProvider, SubjectSource};
pub use registry::Registry;
