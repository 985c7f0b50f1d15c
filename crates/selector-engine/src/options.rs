//! Per-parse configuration: which rule kind a prefix-less atom binds to,
//! the nested-lookup delimiter, registered node group macros, and the
//! range provider a `YahooRange` leaf calls through.

use selector_core::RangeProvider;
use std::collections::HashMap;
use std::sync::Arc;

/// Tags one of the registry's leaf rule kinds, independent of any
/// particular `expr`/`delim`/`provider` payload — used both to pick the
/// default prefix-less evaluator and, in reverse, to print the right
/// prefix back out of `querify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Glob,
    Pcre,
    Grain,
    Pillar,
    GrainPcre,
    SubnetIp,
    Exsel,
    LocalStore,
    YahooRange,
}

impl RuleKind {
    pub fn name(self) -> &'static str {
        match self {
            RuleKind::Glob => "glob",
            RuleKind::Pcre => "pcre",
            RuleKind::Grain => "grain",
            RuleKind::Pillar => "pillar",
            RuleKind::GrainPcre => "grain_pcre",
            RuleKind::SubnetIp => "subnet_ip",
            RuleKind::Exsel => "exsel",
            RuleKind::LocalStore => "local_store",
            RuleKind::YahooRange => "yahoo_range",
        }
    }
}

#[derive(Clone)]
pub struct Options {
    pub default_rule: RuleKind,
    pub delim: char,
    pub macros: HashMap<String, String>,
    pub range_provider: Option<Arc<dyn RangeProvider>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            default_rule: RuleKind::Glob,
            delim: ':',
            macros: HashMap::new(),
            range_provider: None,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("default_rule", &self.default_rule)
            .field("delim", &self.delim)
            .field("macros", &self.macros)
            .field("range_provider", &self.range_provider.is_some())
            .finish()
    }
}
