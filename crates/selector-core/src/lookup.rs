//! Attribute lookup helpers: glob/pcre matching, CIDR containment, and the
//! nested-mapping `dig` traversal used by every fact-based rule kind.

use crate::error::{Error, Result};
use globset::GlobBuilder;
use regex::Regex;
use serde_json::Value;
use std::net::Ipv4Addr;

/// Shell-style glob match against a flat string (used by `GlobRule` against
/// a subject's `id`).
pub fn glob_match_str(expr: &str, value: &str) -> Result<bool> {
    let glob = GlobBuilder::new(expr)
        .literal_separator(false)
        .build()
        .map_err(|e| Error::MalformedExpression {
            expr: expr.to_string(),
            reason: e.to_string(),
        })?;
    Ok(glob.compile_matcher().is_match(value))
}

/// Anchored regex match against a flat string (used by `PCRERule`).
pub fn pcre_match_str(expr: &str, value: &str) -> Result<bool> {
    Ok(pcre_compile(expr)?.is_match(value))
}

/// Compiles `expr` as a regex anchored at both ends, the way
/// `re.match(...)` combined with a trailing `$` behaves.
pub fn pcre_compile(expr: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{expr})$")).map_err(|e| Error::MalformedExpression {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Glob match against a nested fact tree (grains/pillar/data), walking `dig`
/// candidates from the longest key-chain to the shortest.
pub fn glob_match_nested(expr: &str, value: &Value, delim: char) -> Result<bool> {
    for (scalar, residual) in dig(value, expr, delim)? {
        match residual {
            None => return Ok(is_truthy(&scalar)),
            Some(glob) => {
                if glob_match_str(&glob, &scalar_to_string(&scalar))? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// PCRE match against a nested fact tree, same traversal as
/// [`glob_match_nested`].
pub fn pcre_match_nested(expr: &str, value: &Value, delim: char) -> Result<bool> {
    for (scalar, residual) in dig(value, expr, delim)? {
        match residual {
            None => return Ok(is_truthy(&scalar)),
            Some(pattern) => {
                if pcre_match_str(&pattern, &scalar_to_string(&scalar))? {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// Whether `ip` falls inside the CIDR block (or bare address) `expr`.
pub fn ipcidr_match_one(expr: &str, ip: Ipv4Addr) -> Result<bool> {
    let (network, bits) = parse_cidr(expr)?;
    let mask = netmask(bits);
    Ok(u32::from(ip) & mask == u32::from(network) & mask)
}

fn parse_cidr(expr: &str) -> Result<(Ipv4Addr, u8)> {
    let (addr, bits) = match expr.split_once('/') {
        Some((addr, bits)) => {
            let bits: u8 = bits.parse().map_err(|_| Error::MalformedExpression {
                expr: expr.to_string(),
                reason: "invalid prefix length".to_string(),
            })?;
            if bits > 32 {
                return Err(Error::MalformedExpression {
                    expr: expr.to_string(),
                    reason: "prefix length out of range".to_string(),
                });
            }
            (addr, bits)
        }
        None => (expr, 32),
    };
    let addr: Ipv4Addr = addr.parse().map_err(|_| Error::MalformedExpression {
        expr: expr.to_string(),
        reason: "invalid IPv4 address".to_string(),
    })?;
    Ok((addr, bits))
}

fn netmask(bits: u8) -> u32 {
    if bits == 0 {
        0
    } else {
        !0u32 << (32 - u32::from(bits))
    }
}

/// Decomposes `expr` into `(key, residual)` pairs from the full expression
/// (no residual) down to the shortest single-key prefix, mirroring the
/// original `decompose_expr`: `"a:b:c"` (delim `:`) yields
/// `("a:b:c", None)`, `("a:b", Some("c"))`, `("a", Some("b:c"))`.
fn decompose_expr(expr: &str, delim: char) -> Vec<(String, Option<String>)> {
    let mut out = vec![(expr.to_string(), None)];
    let mut key = expr.to_string();
    let mut residual: Option<String> = None;
    while let Some(idx) = key.rfind(delim) {
        let rest = key[idx + 1..].to_string();
        residual = Some(match residual {
            None => rest,
            Some(prev) => format!("{rest}{delim}{prev}"),
        });
        key.truncate(idx);
        out.push((key.clone(), residual.clone()));
    }
    out
}

/// Walks `data` trying every suffix split of `expr` from longest key-chain
/// to shortest, recursing element-wise through arrays, and yields every
/// `(scalar, residual)` pair reached at a leaf value.
///
/// `expr` must contain `delim` at least once — a delim-less expr can never
/// be walked as a nested key chain, and the original (`matching.py`'s
/// `dig`) raises rather than silently treating the whole expr as one key.
pub fn dig(data: &Value, expr: &str, delim: char) -> Result<Vec<(Value, Option<String>)>> {
    if !expr.contains(delim) {
        return Err(Error::MalformedExpression {
            expr: expr.to_string(),
            reason: format!("expected to contain delimiter `{delim}`"),
        });
    }
    let mut out = Vec::new();
    explore(data, Some(expr.to_string()), delim, &mut out);
    Ok(out)
}

fn explore(data: &Value, residual: Option<String>, delim: char, out: &mut Vec<(Value, Option<String>)>) {
    match data {
        Value::Array(items) => {
            for item in items {
                explore(item, residual.clone(), delim, out);
            }
        }
        Value::Object(map) => {
            let Some(expr) = residual else {
                // An exact-match request reached a mapping: there is no
                // scalar here to test truthiness of, so nothing to yield.
                return;
            };
            for (key, next_residual) in decompose_expr(&expr, delim) {
                if let Some(child) = map.get(&key) {
                    explore(child, next_residual, delim, out);
                }
            }
        }
        scalar => out.push((scalar.clone(), residual)),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Python-style truthiness over a JSON scalar: empty string/array/object,
/// `null`, `false`, and `0` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn glob_matches_plain_string() {
        assert!(glob_match_str("web*", "web01").unwrap());
        assert!(!glob_match_str("web*", "db01").unwrap());
    }

    #[test]
    fn pcre_is_anchored() {
        assert!(pcre_match_str("web\\d+", "web01").unwrap());
        assert!(!pcre_match_str("web\\d+", "xweb01").unwrap());
    }

    #[test]
    fn cidr_contains() {
        assert!(ipcidr_match_one("10.0.0.0/8", "10.1.2.3".parse().unwrap()).unwrap());
        assert!(!ipcidr_match_one("10.0.0.0/8", "11.1.2.3".parse().unwrap()).unwrap());
    }

    #[test]
    fn dig_walks_longest_key_first() {
        let grains = json!({"os": "Ubuntu", "role": ["web", "front"]});
        assert!(glob_match_nested("os:Ubuntu*", &grains, ':').unwrap());
        assert!(glob_match_nested("role:web", &grains, ':').unwrap());
    }

    #[test]
    fn dig_exact_key_checks_truthiness() {
        // The outer expr still contains `delim`; it's only the residual
        // reached after descending into `a` that runs out of delimiter,
        // which is where the exact-key truthiness check kicks in.
        let grains = json!({"a": {"virtual": "physical"}});
        assert!(glob_match_nested("a:virtual", &grains, ':').unwrap());
        let grains = json!({"a": {"virtual": ""}});
        assert!(!glob_match_nested("a:virtual", &grains, ':').unwrap());
    }

    #[test]
    fn dig_multiword_value() {
        let pillar = json!({"fullname": "John Doe"});
        assert!(glob_match_nested("fullname:John Doe", &pillar, ':').unwrap());
    }

    #[test]
    fn dig_rejects_expr_with_no_delimiter() {
        let grains = json!({"virtual": "physical"});
        let err = glob_match_nested("virtual", &grains, ':').unwrap_err();
        assert!(matches!(err, Error::MalformedExpression { .. }));
    }
}
