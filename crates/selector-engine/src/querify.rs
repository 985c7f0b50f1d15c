//! The inverse of [`crate::registry::Registry::parse`]: prints a rule tree
//! back as selector query text. Round-trip identity (`parse(querify(r)) ==
//! r`) holds only up to the flattening and priority reordering `All`/`Any`
//! canonicalization already applies to the rule tree itself.

use crate::options::RuleKind;
use crate::registry::Registry;
use selector_core::Rule;

impl Registry {
    /// Serializes `rule` back to selector query text using this
    /// registry's prefix table and default rule kind.
    pub fn querify(&self, rule: &Rule) -> String {
        match rule {
            Rule::Not(inner) => format!("not {}", self.parenthesized(inner)),
            Rule::Any(children) => children.iter().map(|c| self.parenthesized(c)).collect::<Vec<_>>().join(" or "),
            Rule::All(children) => children.iter().map(|c| self.parenthesized(c)).collect::<Vec<_>>().join(" and "),
            leaf => self.leaf_text(leaf),
        }
    }

    fn parenthesized(&self, rule: &Rule) -> String {
        match rule {
            Rule::All(_) | Rule::Any(_) => format!("({})", self.querify(rule)),
            other => self.querify(other),
        }
    }

    fn leaf_text(&self, rule: &Rule) -> String {
        let Some((kind, expr)) = rule_kind_and_expr(rule) else {
            // Not/All/Any were handled by the caller; a `rule` arriving
            // here is always a leaf.
            return String::new();
        };
        if kind == self.options.default_rule {
            expr.to_string()
        } else if let Some(prefix) = self.prefix_for(kind) {
            format!("{prefix}@{expr}")
        } else {
            // A leaf kind this registry never registered a prefix for —
            // can't happen for a rule this registry itself parsed, but a
            // hand-built `Rule` could reach here; fall back to bare expr
            // rather than panicking.
            expr.to_string()
        }
    }
}

fn rule_kind_and_expr(rule: &Rule) -> Option<(RuleKind, &str)> {
    match rule {
        Rule::Glob { expr } => Some((RuleKind::Glob, expr)),
        Rule::Pcre { expr } => Some((RuleKind::Pcre, expr)),
        Rule::Grain { expr, .. } => Some((RuleKind::Grain, expr)),
        Rule::Pillar { expr, .. } => Some((RuleKind::Pillar, expr)),
        Rule::GrainPcre { expr, .. } => Some((RuleKind::GrainPcre, expr)),
        Rule::SubnetIp { expr } => Some((RuleKind::SubnetIp, expr)),
        Rule::Exsel { expr } => Some((RuleKind::Exsel, expr)),
        Rule::LocalStore { expr, .. } => Some((RuleKind::LocalStore, expr)),
        Rule::YahooRange { expr, .. } => Some((RuleKind::YahooRange, expr)),
        Rule::All(_) | Rule::Any(_) | Rule::Not(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn glob_round_trips_bare() {
        let registry = Registry::standard();
        let rule = registry.parse("web*").unwrap();
        assert_eq!(registry.querify(&rule), "web*");
    }

    #[test]
    fn prefixed_leaf_round_trips() {
        let registry = Registry::standard();
        let rule = registry.parse("G@os:Ubuntu").unwrap();
        assert_eq!(registry.querify(&rule), "G@os:Ubuntu");
    }

    #[test]
    fn combinators_parenthesize_children() {
        let registry = Registry::standard();
        let rule = registry.parse("not (G@bar:baz or toto)").unwrap();
        // `Any`'s children are canonicalized by ascending priority (Glob
        // 10 before Grain 40), so the printed order doesn't echo the
        // parsed order — round-trip holds only up to that reordering.
        assert_eq!(registry.querify(&rule), "not (toto or G@bar:baz)");
    }

    #[test]
    fn and_joins_without_outer_parens() {
        let registry = Registry::standard();
        let rule = registry.parse("a and b").unwrap();
        assert_eq!(registry.querify(&rule), "a and b");
    }
}
