//! The evaluator registry: binds prefix characters and shortcut names to
//! rule kinds, parses full compound queries by dispatching each atom
//! through that binding, and serializes a rule tree back to query text.

use crate::error::{EngineError, Result};
use crate::options::{Options, RuleKind};
use selector_core::Rule;
use selector_parse::{normalize, Expr};
use std::collections::HashMap;

/// What a registered prefix or shortcut actually does with the raw text
/// that follows it.
#[derive(Clone)]
enum Evaluator {
    /// Binds straight to a leaf rule of the given kind.
    Rule(RuleKind),
    /// Splits `raw_value` on commas and builds an `Any` of the default
    /// rule kind over each piece (`L@foo,bar,baz*`).
    List,
    /// Looks `raw_value` up in `opts.macros` and recursively parses the
    /// resolved query text (`N@some-group`).
    NodeGroup,
}

/// Associates prefix characters (`G`, `I`, …) and shortcut names (`grain`,
/// `pillar`, …) with evaluators, and holds the default [`Options`] a
/// `parse` call falls back on. Construct with [`Registry::standard`] for
/// the built-in prefix table, or build a custom one with [`Registry::new`]
/// plus the `register_*` methods.
#[derive(Clone)]
pub struct Registry {
    prefixes: HashMap<char, Evaluator>,
    shortcuts: HashMap<String, Evaluator>,
    rule_prefixes: HashMap<RuleKind, char>,
    pub options: Options,
}

impl Registry {
    pub fn new(options: Options) -> Self {
        Registry {
            prefixes: HashMap::new(),
            shortcuts: HashMap::new(),
            rule_prefixes: HashMap::new(),
            options,
        }
    }

    /// The built-in prefix table: one entry per leaf rule kind, plus the
    /// `list` and `node_group` evaluators.
    pub fn standard() -> Self {
        let mut registry = Registry::new(Options::default());
        registry.register_rule(None, Some("glob"), RuleKind::Glob).unwrap();
        registry.register_rule(Some('G'), Some("grain"), RuleKind::Grain).unwrap();
        registry.register_rule(Some('I'), Some("pillar"), RuleKind::Pillar).unwrap();
        registry.register_rule(Some('E'), Some("pcre"), RuleKind::Pcre).unwrap();
        registry.register_rule(Some('P'), Some("grain_pcre"), RuleKind::GrainPcre).unwrap();
        registry.register_rule(Some('S'), None, RuleKind::SubnetIp).unwrap();
        registry.register_rule(Some('X'), Some("exsel"), RuleKind::Exsel).unwrap();
        registry.register_rule(Some('D'), None, RuleKind::LocalStore).unwrap();
        registry.register_rule(Some('R'), None, RuleKind::YahooRange).unwrap();
        registry.register_list(Some('L'), Some("list")).unwrap();
        registry.register_node_group(Some('N'), None).unwrap();
        registry
    }

    /// Registers a leaf rule kind under an optional prefix character and/or
    /// shortcut name. Use this to build a non-standard registry; errors if
    /// the prefix or shortcut is already taken.
    pub fn register_rule(&mut self, prefix: Option<char>, shortcut: Option<&str>, kind: RuleKind) -> Result<()> {
        self.register(prefix, shortcut, Evaluator::Rule(kind))
    }

    /// Registers a comma-split `Any`-of-default-rule-kind evaluator (the
    /// `L@`/`list` shortcut) under an optional prefix and/or shortcut name.
    pub fn register_list(&mut self, prefix: Option<char>, shortcut: Option<&str>) -> Result<()> {
        self.register(prefix, shortcut, Evaluator::List)
    }

    /// Registers a macro-expanding evaluator (the `N@` node-group prefix)
    /// under an optional prefix and/or shortcut name.
    pub fn register_node_group(&mut self, prefix: Option<char>, shortcut: Option<&str>) -> Result<()> {
        self.register(prefix, shortcut, Evaluator::NodeGroup)
    }

    fn register(&mut self, prefix: Option<char>, shortcut: Option<&str>, evaluator: Evaluator) -> Result<()> {
        if let Some(p) = prefix {
            if self.prefixes.contains_key(&p) {
                return Err(EngineError::Usage(format!("prefix `{p}` is already registered")));
            }
        }
        if let Some(name) = shortcut {
            if self.shortcuts.contains_key(name) {
                return Err(EngineError::Usage(format!("shortcut `{name}` is already registered")));
            }
        }
        if let (Some(p), Evaluator::Rule(kind)) = (prefix, &evaluator) {
            self.rule_prefixes.insert(*kind, p);
        }
        if let Some(p) = prefix {
            self.prefixes.insert(p, evaluator.clone());
        }
        if let Some(name) = shortcut {
            self.shortcuts.insert(name.to_string(), evaluator);
        }
        Ok(())
    }

    /// Parses a full compound query against this registry's default
    /// [`Options`]. `parse_compound` in the original source is the same
    /// function under a second name — there is only one `parse` here.
    pub fn parse(&self, query: &str) -> Result<Rule> {
        self.parse_with(query, &self.options)
    }

    /// Parses a full compound query against explicit `opts`, overriding
    /// this registry's defaults for this call only.
    pub fn parse_with(&self, query: &str, opts: &Options) -> Result<Rule> {
        let expr = selector_parse::parse(query)?;
        self.bind(&expr, opts)
    }

    /// A shortcut's direct parse function (`parse_grain("os:Ubuntu", ..)`
    /// instead of `parse("G@os:Ubuntu")`): looks `name` up in the shortcut
    /// table and applies its evaluator straight to `raw_value`, bypassing
    /// the `and`/`or`/`not` grammar entirely.
    pub fn parse_shortcut(&self, name: &str, raw_value: &str, opts: &Options) -> Result<Rule> {
        let evaluator = self
            .shortcuts
            .get(name)
            .ok_or_else(|| EngineError::Usage(format!("no shortcut registered as `{name}`")))?;
        self.apply(evaluator, &normalize(raw_value), opts)
    }

    fn bind(&self, expr: &Expr, opts: &Options) -> Result<Rule> {
        match expr {
            Expr::Atom(text) => self.bind_atom(text, opts),
            Expr::Not(inner) => Ok(Rule::not(self.bind(inner, opts)?)),
            Expr::All(children) => {
                let rules = children.iter().map(|c| self.bind(c, opts)).collect::<Result<Vec<_>>>()?;
                Ok(Rule::all(rules))
            }
            Expr::Any(children) => {
                let rules = children.iter().map(|c| self.bind(c, opts)).collect::<Result<Vec<_>>>()?;
                Ok(Rule::any(rules))
            }
        }
    }

    /// Splits an atom on the first `@`: a non-empty, registered prefix
    /// dispatches to its evaluator over the remainder; anything else (no
    /// `@`, an unregistered prefix, or an empty remainder) falls back to
    /// the default rule kind over the whole, normalized atom text.
    fn bind_atom(&self, text: &str, opts: &Options) -> Result<Rule> {
        if let Some((prefix, raw_value)) = split_prefix(text) {
            if !raw_value.is_empty() {
                if let Some(evaluator) = self.prefixes.get(&prefix) {
                    return self.apply(evaluator, &normalize(raw_value), opts);
                }
            }
        }
        self.apply(&Evaluator::Rule(opts.default_rule), &normalize(text), opts)
    }

    fn apply(&self, evaluator: &Evaluator, raw_value: &str, opts: &Options) -> Result<Rule> {
        match evaluator {
            Evaluator::Rule(kind) => build_leaf(*kind, raw_value, opts),
            Evaluator::List => {
                let sub_rules = raw_value
                    .split(',')
                    .map(|value| build_leaf(opts.default_rule, value, opts))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Rule::any(sub_rules))
            }
            Evaluator::NodeGroup => {
                let query = opts
                    .macros
                    .get(raw_value)
                    .ok_or_else(|| EngineError::UnknownMacro(raw_value.to_string()))?;
                self.parse_with(query, opts)
            }
        }
    }

    /// The prefix a given rule kind is registered under, if any — used by
    /// [`crate::querify::querify`] to print `PREFIX@expr` for a leaf that
    /// isn't the default rule kind.
    pub fn prefix_for(&self, kind: RuleKind) -> Option<char> {
        self.rule_prefixes.get(&kind).copied()
    }
}

fn build_leaf(kind: RuleKind, raw_value: &str, opts: &Options) -> Result<Rule> {
    Ok(match kind {
        RuleKind::Glob => Rule::glob(raw_value),
        RuleKind::Pcre => Rule::pcre(raw_value),
        RuleKind::Grain => Rule::grain(raw_value, opts.delim),
        RuleKind::Pillar => Rule::pillar(raw_value, opts.delim),
        RuleKind::GrainPcre => Rule::grain_pcre(raw_value, opts.delim),
        RuleKind::SubnetIp => Rule::subnet_ip(raw_value),
        RuleKind::Exsel => Rule::exsel(raw_value),
        RuleKind::LocalStore => Rule::local_store(raw_value, opts.delim),
        RuleKind::YahooRange => {
            let provider = opts
                .range_provider
                .clone()
                .ok_or_else(|| EngineError::Usage("R@ used but no range_provider configured".to_string()))?;
            Rule::yahoo_range(raw_value, provider)
        }
    })
}

/// Splits on the first `@`, returning `(prefix_char, rest)` only when the
/// part before `@` is exactly one letter — anything else (no `@`, a
/// multi-char prefix, `@` at position 0) isn't a candidate prefix at all.
fn split_prefix(text: &str) -> Option<(char, &str)> {
    let (head, rest) = text.split_once('@')?;
    let mut chars = head.chars();
    let c = chars.next()?;
    if chars.next().is_none() && c.is_alphabetic() {
        Some((c, rest))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selector_core::Subject;

    #[test]
    fn glob_only() {
        let registry = Registry::standard();
        let rule = registry.parse("web*").unwrap();
        assert!(rule.is_match(&Subject::new("web01")).unwrap());
    }

    #[test]
    fn grain_prefix_dispatch() {
        let registry = Registry::standard();
        let rule = registry.parse("G@os:Ubuntu").unwrap();
        let subject = Subject::new("web01").with_grains(serde_json::json!({"os": "Ubuntu"}));
        assert!(rule.is_match(&subject).unwrap());
    }

    #[test]
    fn list_shortcut_builds_any_of_globs() {
        let registry = Registry::standard();
        let rule = registry.parse("L@foo,bar,baz*").unwrap();
        assert!(matches!(rule, Rule::Any(_)));
        assert!(rule.is_match(&Subject::new("bazinga")).unwrap());
        assert!(!rule.is_match(&Subject::new("quux")).unwrap());
    }

    #[test]
    fn node_group_resolves_macro() {
        let mut registry = Registry::standard();
        registry.options.macros.insert("web-fleet".to_string(), "web*".to_string());
        let rule = registry.parse("N@web-fleet").unwrap();
        assert!(rule.is_match(&Subject::new("web01")).unwrap());
    }

    #[test]
    fn node_group_unknown_macro_errors() {
        let registry = Registry::standard();
        assert!(matches!(registry.parse("N@nope"), Err(EngineError::UnknownMacro(_))));
    }

    #[test]
    fn duplicate_prefix_is_a_usage_error() {
        let mut registry = Registry::new(Options::default());
        registry.register_rule(Some('G'), None, RuleKind::Grain).unwrap();
        assert!(matches!(
            registry.register_rule(Some('G'), None, RuleKind::Pillar),
            Err(EngineError::Usage(_))
        ));
    }

    #[test]
    fn shortcut_bypasses_grammar() {
        let registry = Registry::standard();
        let rule = registry.parse_shortcut("grain", "os:Ubuntu", &registry.options).unwrap();
        let subject = Subject::new("web01").with_grains(serde_json::json!({"os": "Ubuntu"}));
        assert!(rule.is_match(&subject).unwrap());
    }

    #[test]
    fn unregistered_prefix_falls_back_to_default_rule() {
        let registry = Registry::standard();
        // "Z" is not registered, so the whole atom is treated as a glob.
        let rule = registry.parse("Z@foo").unwrap();
        assert!(rule.is_match(&Subject::new("Z@foo")).unwrap());
    }
}
