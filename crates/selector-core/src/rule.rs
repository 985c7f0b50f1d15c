//! The rule algebra: glob/pcre/grain/pillar/CIDR/exsel/range leaves plus
//! `All`/`Any`/`Not` combinators, each with a fixed evaluation priority.

use crate::error::{Error, Result};
use crate::filter::FilterOutcome;
use crate::lookup::{glob_match_nested, glob_match_str, ipcidr_match_one, pcre_match_nested, pcre_match_str};
use crate::provider::RangeProvider;
use crate::subject::Subject;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// A node in the selector rule tree.
///
/// Leaves match a single attribute; combinators fold child rules together.
/// Construct combinators through [`Rule::all`]/[`Rule::any`]/[`Rule::not`]
/// (or the `&`/`|`/`-` operator overloads) rather than the enum variants
/// directly — those constructors flatten nested same-kind combinators,
/// drop duplicate children, collapse double negation, and keep children in
/// a fixed evaluation order.
#[derive(Clone)]
pub enum Rule {
    Glob { expr: String },
    Pcre { expr: String },
    Grain { expr: String, delim: char },
    Pillar { expr: String, delim: char },
    GrainPcre { expr: String, delim: char },
    SubnetIp { expr: String },
    Exsel { expr: String },
    LocalStore { expr: String, delim: char },
    YahooRange { expr: String, provider: Arc<dyn RangeProvider> },
    All(Vec<Rule>),
    Any(Vec<Rule>),
    Not(Box<Rule>),
}

impl Rule {
    pub fn glob(expr: impl Into<String>) -> Self {
        Rule::Glob { expr: expr.into() }
    }
    pub fn pcre(expr: impl Into<String>) -> Self {
        Rule::Pcre { expr: expr.into() }
    }
    pub fn grain(expr: impl Into<String>, delim: char) -> Self {
        Rule::Grain { expr: expr.into(), delim }
    }
    pub fn pillar(expr: impl Into<String>, delim: char) -> Self {
        Rule::Pillar { expr: expr.into(), delim }
    }
    pub fn grain_pcre(expr: impl Into<String>, delim: char) -> Self {
        Rule::GrainPcre { expr: expr.into(), delim }
    }
    pub fn subnet_ip(expr: impl Into<String>) -> Self {
        Rule::SubnetIp { expr: expr.into() }
    }
    pub fn exsel(expr: impl Into<String>) -> Self {
        Rule::Exsel { expr: expr.into() }
    }
    pub fn local_store(expr: impl Into<String>, delim: char) -> Self {
        Rule::LocalStore { expr: expr.into(), delim }
    }
    pub fn yahoo_range(expr: impl Into<String>, provider: Arc<dyn RangeProvider>) -> Self {
        Rule::YahooRange { expr: expr.into(), provider }
    }

    /// Builds an `All`, flattening nested `All`s and dropping duplicates.
    pub fn all(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::All(canonicalize(flatten(rules.into_iter().collect(), |r| matches!(r, Rule::All(_)), |r| {
            match r {
                Rule::All(children) => children,
                _ => unreachable!(),
            }
        })))
    }

    /// Builds an `Any`, flattening nested `Any`s and dropping duplicates.
    pub fn any(rules: impl IntoIterator<Item = Rule>) -> Self {
        Rule::Any(canonicalize(flatten(rules.into_iter().collect(), |r| matches!(r, Rule::Any(_)), |r| {
            match r {
                Rule::Any(children) => children,
                _ => unreachable!(),
            }
        })))
    }

    /// Builds a `Not`, collapsing `Not(Not(r))` into `r`.
    pub fn not(rule: Rule) -> Self {
        match rule {
            Rule::Not(inner) => *inner,
            other => Rule::Not(Box::new(other)),
        }
    }

    /// Fixed evaluation priority (lower runs first): cheap identity checks
    /// before fact lookups before external calls before combinators.
    pub fn priority(&self) -> u8 {
        match self {
            Rule::Glob { .. } => 10,
            Rule::Pcre { .. } => 20,
            Rule::SubnetIp { .. } => 30,
            Rule::Grain { .. } | Rule::Pillar { .. } | Rule::GrainPcre { .. } | Rule::LocalStore { .. } => 40,
            Rule::YahooRange { .. } => 50,
            Rule::Exsel { .. } => 60,
            Rule::All(_) => 70,
            Rule::Any(_) => 80,
            Rule::Not(_) => 90,
        }
    }

    /// Exact boolean match against a single subject.
    pub fn is_match(&self, subject: &Subject) -> Result<bool> {
        match self {
            Rule::Glob { expr } => match subject.id.as_deref() {
                Some(id) => glob_match_str(expr, id),
                None => {
                    tracing::warn!(rule = "glob", "id is missing");
                    Ok(false)
                }
            },
            Rule::Pcre { expr } => match subject.id.as_deref() {
                Some(id) => pcre_match_str(expr, id),
                None => {
                    tracing::warn!(rule = "pcre", "id is missing");
                    Ok(false)
                }
            },
            Rule::Grain { expr, delim } => match &subject.grains {
                Some(v) => glob_match_nested(expr, v, *delim),
                None => {
                    tracing::warn!(id = ?subject.id, "grains are missing");
                    Ok(false)
                }
            },
            Rule::Pillar { expr, delim } => match &subject.pillar {
                Some(v) => glob_match_nested(expr, v, *delim),
                None => {
                    tracing::warn!(id = ?subject.id, "pillar is missing");
                    Ok(false)
                }
            },
            Rule::GrainPcre { expr, delim } => match &subject.grains {
                Some(v) => pcre_match_nested(expr, v, *delim),
                None => {
                    tracing::warn!(id = ?subject.id, "grains are missing");
                    Ok(false)
                }
            },
            Rule::LocalStore { expr, delim } => match &subject.data {
                Some(v) => glob_match_nested(expr, v, *delim),
                None => {
                    tracing::warn!(id = ?subject.id, "data is missing");
                    Ok(false)
                }
            },
            Rule::SubnetIp { expr } => match &subject.ipv4 {
                Some(field) => {
                    for ip in field.iter() {
                        if ipcidr_match_one(expr, ip)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                None => {
                    tracing::warn!(id = ?subject.id, "ipv4 is missing");
                    Ok(false)
                }
            },
            Rule::Exsel { expr } => match &subject.functions {
                Some(funcs) => match funcs.get(expr) {
                    Some(f) => Ok(f()),
                    None => {
                        tracing::warn!(id = ?subject.id, expr = %expr, "function is missing");
                        Ok(false)
                    }
                },
                None => {
                    tracing::warn!(id = ?subject.id, "functions is missing");
                    Ok(false)
                }
            },
            Rule::YahooRange { expr, provider } => match subject.fqdn.as_deref() {
                Some(fqdn) => {
                    let hosts = provider.get(expr).map_err(|source| Error::External {
                        expr: expr.clone(),
                        source,
                    })?;
                    Ok(hosts.iter().any(|h| h == fqdn))
                }
                None => {
                    tracing::warn!(id = ?subject.id, "fqdn is missing");
                    Ok(false)
                }
            },
            Rule::All(children) => {
                for child in children {
                    if !child.is_match(subject)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Rule::Any(children) => {
                for child in children {
                    if child.is_match(subject)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Rule::Not(inner) => Ok(!inner.is_match(subject)?),
        }
    }

    /// Filters an entire subject pool, returning certain matches plus any
    /// subjects whose attributes were missing.
    pub fn filter(&self, subjects: &[Subject]) -> Result<FilterOutcome> {
        let subset: BTreeSet<usize> = (0..subjects.len()).collect();
        self.filter_subset(subjects, &subset)
    }

    fn filter_subset(&self, subjects: &[Subject], subset: &BTreeSet<usize>) -> Result<FilterOutcome> {
        match self {
            Rule::Glob { expr } => leaf_filter(subjects, subset, |s| s.id.as_deref(), |id| glob_match_str(expr, id)),
            Rule::Pcre { expr } => leaf_filter(subjects, subset, |s| s.id.as_deref(), |id| pcre_match_str(expr, id)),
            Rule::Grain { expr, delim } => {
                leaf_filter(subjects, subset, |s| s.grains.as_ref(), |v| glob_match_nested(expr, v, *delim))
            }
            Rule::Pillar { expr, delim } => {
                leaf_filter(subjects, subset, |s| s.pillar.as_ref(), |v| glob_match_nested(expr, v, *delim))
            }
            Rule::GrainPcre { expr, delim } => {
                leaf_filter(subjects, subset, |s| s.grains.as_ref(), |v| pcre_match_nested(expr, v, *delim))
            }
            Rule::LocalStore { expr, delim } => {
                leaf_filter(subjects, subset, |s| s.data.as_ref(), |v| glob_match_nested(expr, v, *delim))
            }
            Rule::SubnetIp { expr } => leaf_filter(subjects, subset, |s| s.ipv4.as_ref(), |field| {
                for ip in field.iter() {
                    if ipcidr_match_one(expr, ip)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }),
            Rule::Exsel { expr } => leaf_filter(subjects, subset, |s| s.functions.as_ref(), |funcs| {
                match funcs.get(expr) {
                    Some(f) => Ok(f()),
                    None => {
                        tracing::warn!(expr = %expr, "function is missing");
                        Ok(false)
                    }
                }
            }),
            Rule::YahooRange { expr, provider } => yahoo_range_filter(subjects, subset, expr, provider.as_ref()),
            Rule::All(children) => all_filter(children, subjects, subset),
            Rule::Any(children) => any_filter(children, subjects, subset),
            Rule::Not(inner) => not_filter(inner, subjects, subset),
        }
    }
}

/// Generic shape shared by every attribute-bearing leaf: a subject either
/// lacks the attribute (uncertain) or has it (certain iff `matcher` says
/// so; otherwise dropped entirely).
fn leaf_filter<T>(
    subjects: &[Subject],
    subset: &BTreeSet<usize>,
    attr: impl Fn(&Subject) -> Option<T>,
    matcher: impl Fn(T) -> Result<bool>,
) -> Result<FilterOutcome> {
    let mut certain = BTreeSet::new();
    let mut uncertain = BTreeSet::new();
    for &i in subset {
        match attr(&subjects[i]) {
            None => {
                uncertain.insert(i);
            }
            Some(value) => {
                if matcher(value)? {
                    certain.insert(i);
                }
            }
        }
    }
    Ok(FilterOutcome { certain, uncertain })
}

fn yahoo_range_filter(
    subjects: &[Subject],
    subset: &BTreeSet<usize>,
    expr: &str,
    provider: &dyn RangeProvider,
) -> Result<FilterOutcome> {
    let mut by_fqdn: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    let mut uncertain = BTreeSet::new();
    for &i in subset {
        match subjects[i].fqdn.as_deref() {
            Some(fqdn) => {
                by_fqdn.insert(fqdn, i);
            }
            None => {
                uncertain.insert(i);
            }
        }
    }
    let mut certain = BTreeSet::new();
    if !by_fqdn.is_empty() {
        let hosts = provider
            .get(expr)
            .map_err(|source| Error::External { expr: expr.to_string(), source })?;
        for host in &hosts {
            if let Some(&i) = by_fqdn.get(host.as_str()) {
                certain.insert(i);
            }
        }
    }
    Ok(FilterOutcome { certain, uncertain })
}

fn all_filter(children: &[Rule], subjects: &[Subject], subset: &BTreeSet<usize>) -> Result<FilterOutcome> {
    let mut working = subset.clone();
    let mut uncertain = BTreeSet::new();
    for child in children {
        if working.is_empty() {
            break;
        }
        let result = child.filter_subset(subjects, &working)?;
        uncertain.extend(result.uncertain);
        working = result.certain;
    }
    Ok(FilterOutcome { certain: working, uncertain })
}

fn any_filter(children: &[Rule], subjects: &[Subject], subset: &BTreeSet<usize>) -> Result<FilterOutcome> {
    let mut remainder = subset.clone();
    let mut certain = BTreeSet::new();
    let mut uncertain = BTreeSet::new();
    for child in children {
        if remainder.is_empty() {
            break;
        }
        let result = child.filter_subset(subjects, &remainder)?;
        for i in &result.certain {
            remainder.remove(i);
        }
        for i in &result.uncertain {
            remainder.remove(i);
        }
        certain.extend(result.certain);
        uncertain.extend(result.uncertain);
    }
    Ok(FilterOutcome { certain, uncertain })
}

fn not_filter(inner: &Rule, subjects: &[Subject], subset: &BTreeSet<usize>) -> Result<FilterOutcome> {
    // Treat every member of `subset` as a fresh query to `inner`, ignoring
    // whatever uncertain/certain status it carried coming in: `Not` can
    // only remove subjects `inner` positively confirms.
    let result = inner.filter_subset(subjects, subset)?;
    let kept: BTreeSet<usize> = subset.difference(&result.certain).copied().collect();
    Ok(FilterOutcome { certain: kept, uncertain: BTreeSet::new() })
}

fn flatten(
    rules: Vec<Rule>,
    is_same_kind: impl Fn(&Rule) -> bool + Copy,
    into_children: impl Fn(Rule) -> Vec<Rule> + Copy,
) -> Vec<Rule> {
    let mut out = Vec::new();
    for r in rules {
        if is_same_kind(&r) {
            out.extend(flatten(into_children(r), is_same_kind, into_children));
        } else {
            out.push(r);
        }
    }
    out
}

fn canonicalize(rules: Vec<Rule>) -> Vec<Rule> {
    let deduped: HashSet<Rule> = rules.into_iter().collect();
    let mut sorted: Vec<Rule> = deduped.into_iter().collect();
    sorted.sort_by(|a, b| (a.priority(), format!("{a:?}")).cmp(&(b.priority(), format!("{b:?}"))));
    sorted
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        use Rule::*;
        match (self, other) {
            (Glob { expr: a }, Glob { expr: b })
            | (Pcre { expr: a }, Pcre { expr: b })
            | (SubnetIp { expr: a }, SubnetIp { expr: b })
            | (Exsel { expr: a }, Exsel { expr: b })
            | (YahooRange { expr: a, .. }, YahooRange { expr: b, .. }) => a == b,
            (Grain { expr: a, delim: d1 }, Grain { expr: b, delim: d2 })
            | (Pillar { expr: a, delim: d1 }, Pillar { expr: b, delim: d2 })
            | (GrainPcre { expr: a, delim: d1 }, GrainPcre { expr: b, delim: d2 })
            | (LocalStore { expr: a, delim: d1 }, LocalStore { expr: b, delim: d2 }) => a == b && d1 == d2,
            (All(a), All(b)) | (Any(a), Any(b)) => a == b,
            (Not(a), Not(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Rule {}

impl std::hash::Hash for Rule {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Rule::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Glob { expr } | Pcre { expr } | SubnetIp { expr } | Exsel { expr } | YahooRange { expr, .. } => {
                expr.hash(state);
            }
            Grain { expr, delim } | Pillar { expr, delim } | GrainPcre { expr, delim } | LocalStore { expr, delim } => {
                expr.hash(state);
                delim.hash(state);
            }
            All(children) | Any(children) => children.hash(state),
            Not(inner) => inner.hash(state),
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rule::Glob { expr } => write!(f, "Glob({expr:?})"),
            Rule::Pcre { expr } => write!(f, "Pcre({expr:?})"),
            Rule::Grain { expr, delim } => write!(f, "Grain({expr:?}, {delim:?})"),
            Rule::Pillar { expr, delim } => write!(f, "Pillar({expr:?}, {delim:?})"),
            Rule::GrainPcre { expr, delim } => write!(f, "GrainPcre({expr:?}, {delim:?})"),
            Rule::SubnetIp { expr } => write!(f, "SubnetIp({expr:?})"),
            Rule::Exsel { expr } => write!(f, "Exsel({expr:?})"),
            Rule::LocalStore { expr, delim } => write!(f, "LocalStore({expr:?}, {delim:?})"),
            Rule::YahooRange { expr, .. } => write!(f, "YahooRange({expr:?})"),
            Rule::All(children) => f.debug_tuple("All").field(children).finish(),
            Rule::Any(children) => f.debug_tuple("Any").field(children).finish(),
            Rule::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

impl std::ops::BitAnd for Rule {
    type Output = Rule;
    fn bitand(self, rhs: Rule) -> Rule {
        Rule::all([self, rhs])
    }
}

impl std::ops::BitOr for Rule {
    type Output = Rule;
    fn bitor(self, rhs: Rule) -> Rule {
        Rule::any([self, rhs])
    }
}

impl std::ops::Neg for Rule {
    type Output = Rule;
    fn neg(self) -> Rule {
        Rule::not(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subjects() -> Vec<Subject> {
        vec![
            Subject::new("web01").with_grains(json!({"os": "Ubuntu", "role": "web"})),
            Subject::new("web02").with_grains(json!({"os": "Debian", "role": "web"})),
            Subject::new("db01").with_grains(json!({"os": "Ubuntu", "role": "db"})),
            Subject::new("db02"), // no grains: uncertain under Grain rules
        ]
    }

    #[test]
    fn glob_filters_by_id() {
        let rule = Rule::glob("web*");
        let subs = subjects();
        let out = rule.filter(&subs).unwrap();
        assert_eq!(out.certain, [0, 1].into_iter().collect());
        assert!(out.uncertain.is_empty());
    }

    #[test]
    fn grain_filter_marks_missing_as_uncertain() {
        let rule = Rule::grain("role:web", ':');
        let subs = subjects();
        let out = rule.filter(&subs).unwrap();
        assert_eq!(out.certain, [0, 1].into_iter().collect());
        assert_eq!(out.uncertain, [3].into_iter().collect());
    }

    #[test]
    fn all_combinator_keeps_uncertain_across_children() {
        let rule = Rule::all([Rule::grain("os:Ubuntu", ':'), Rule::grain("role:web", ':')]);
        let subs = subjects();
        let out = rule.filter(&subs).unwrap();
        // web01 matches both; db02 is uncertain the whole way through.
        assert!(out.certain.contains(&0));
        assert!(out.uncertain.contains(&3));
        assert!(!out.certain.contains(&2)); // db01: os matches, role doesn't
    }

    #[test]
    fn not_drops_only_certain_matches() {
        let rule = Rule::not(Rule::grain("role:web", ':'));
        let subs = subjects();
        let out = rule.filter(&subs).unwrap();
        // db01 (role:db) and db02 (uncertain) both survive; web01/web02 don't.
        assert_eq!(out.certain, [2, 3].into_iter().collect());
        assert!(out.uncertain.is_empty());
    }

    #[test]
    fn double_negation_collapses() {
        let rule = Rule::not(Rule::not(Rule::glob("web*")));
        assert_eq!(rule, Rule::glob("web*"));
    }

    #[test]
    fn all_flattens_and_dedupes() {
        let a = Rule::glob("web*");
        let b = Rule::grain("role:web", ':');
        let nested = Rule::all([Rule::all([a.clone(), b.clone()]), a.clone()]);
        match nested {
            Rule::All(children) => assert_eq!(children.len(), 2),
            _ => panic!("expected All"),
        }
    }

    #[test]
    fn operator_overloads_build_combinators() {
        let rule = Rule::grain("os:Ubuntu", ':') & Rule::grain("role:web", ':');
        assert!(matches!(rule, Rule::All(_)));
        let rule = Rule::grain("os:Ubuntu", ':') | Rule::grain("role:web", ':');
        assert!(matches!(rule, Rule::Any(_)));
        let rule = -Rule::glob("web*");
        assert!(matches!(rule, Rule::Not(_)));
    }
}
