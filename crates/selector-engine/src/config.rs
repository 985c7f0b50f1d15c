//! Loads the non-`Rule`-constructing half of [`crate::options::Options`]
//! (default rule kind, delimiter, macros) from a config file, the way a
//! control-plane process would set up a `Registry` at startup. A
//! `range_provider` and `Subject::functions` callables can't be
//! deserialized — those stay code-configured.

use crate::error::{EngineError, Result};
use crate::options::{Options, RuleKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawOptions {
    #[serde(default)]
    default_rule: Option<String>,
    #[serde(default)]
    delim: Option<String>,
    #[serde(default)]
    macros: HashMap<String, String>,
}

/// Loads `Options` from a TOML/YAML/JSON config file (format inferred from
/// the extension by the `config` crate), layered over the field defaults
/// `Options::default()` already provides.
pub fn load_options(path: impl AsRef<Path>) -> Result<Options> {
    let raw: RawOptions = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .build()?
        .try_deserialize()?;
    merge(raw)
}

fn merge(raw: RawOptions) -> Result<Options> {
    let mut opts = Options::default();
    if let Some(name) = raw.default_rule {
        opts.default_rule = rule_kind_by_name(&name)?;
    }
    if let Some(delim) = raw.delim {
        let mut chars = delim.chars();
        let c = chars.next().ok_or_else(|| EngineError::Usage("delim must be a single character".to_string()))?;
        if chars.next().is_some() {
            return Err(EngineError::Usage("delim must be a single character".to_string()));
        }
        opts.delim = c;
    }
    opts.macros = raw.macros;
    Ok(opts)
}

fn rule_kind_by_name(name: &str) -> Result<RuleKind> {
    Ok(match name {
        "glob" => RuleKind::Glob,
        "pcre" => RuleKind::Pcre,
        "grain" => RuleKind::Grain,
        "pillar" => RuleKind::Pillar,
        "grain_pcre" => RuleKind::GrainPcre,
        "subnet_ip" => RuleKind::SubnetIp,
        "exsel" => RuleKind::Exsel,
        "local_store" => RuleKind::LocalStore,
        "yahoo_range" => RuleKind::YahooRange,
        other => return Err(EngineError::Usage(format!("unknown default_rule `{other}`"))),
    })
}
