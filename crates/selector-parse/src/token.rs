//! Tokenizer: splits a selector query into `and`/`or`/`not` keywords,
//! parenthesized sub-queries, and opaque atoms.
//!
//! Keywords only match at a word boundary *and* only when followed by
//! whitespace or end-of-input — `andy` and `(sandbox)` are never mistaken
//! for the `and` keyword. A parenthesized span is only a sub-query token
//! when it is balanced and contains at least one interior whitespace
//! character; `(a)` alone has no interior space, so it falls through and
//! is tokenized as a plain atom instead.

use crate::error::{ParseError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    And,
    Or,
    Not,
    SubQuery(&'a str),
    Expr(&'a str),
}

/// Tokenizes `source` left to right, skipping whitespace between tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < len {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if let Some(rest_len) = match_keyword(&source[i..], "and") {
            tokens.push(Token::And);
            i += rest_len;
            continue;
        }
        if let Some(rest_len) = match_keyword(&source[i..], "or") {
            tokens.push(Token::Or);
            i += rest_len;
            continue;
        }
        if let Some(rest_len) = match_keyword(&source[i..], "not") {
            tokens.push(Token::Not);
            i += rest_len;
            continue;
        }

        if bytes[i] == b'(' {
            if let Some(end) = match_sub_query(&source[i..]) {
                tokens.push(Token::SubQuery(&source[i + 1..i + end - 1]));
                i += end;
                continue;
            }
        }

        let start = i;
        while i < len && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        tokens.push(Token::Expr(&source[start..i]));
    }

    Ok(tokens)
}

/// If `s` starts with keyword `kw` followed by whitespace or end-of-input,
/// returns the byte length consumed (just `kw.len()`, since keywords are
/// ASCII and the boundary check looks at, but does not consume, the next
/// byte).
fn match_keyword(s: &str, kw: &str) -> Option<usize> {
    if !s.starts_with(kw) {
        return None;
    }
    match s.as_bytes().get(kw.len()) {
        None => Some(kw.len()),
        Some(b) if b.is_ascii_whitespace() => Some(kw.len()),
        _ => None,
    }
}

/// Scans a balanced parenthesized span starting at byte 0 of `s` (which
/// must start with `(`). Returns the length of the whole `(...)` span,
/// measured in bytes, if it is balanced, contains interior whitespace, and
/// is immediately followed by whitespace or end-of-input.
fn match_sub_query(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut close = None;
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;
    if depth != 0 {
        return None;
    }
    let inner = &s[1..close];
    if !inner.bytes().any(|b| b.is_ascii_whitespace()) {
        return None;
    }
    match bytes.get(close + 1) {
        None => Some(close + 1),
        Some(b) if b.is_ascii_whitespace() => Some(close + 1),
        _ => None,
    }
}

/// Used by the parser to report an unbalanced-paren query as a distinct
/// error instead of silently degrading to atom tokens; called once up
/// front over the whole query.
pub fn check_balanced(source: &str) -> Result<()> {
    let mut depth = 0i32;
    for b in source.bytes() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(ParseError::UnbalancedParens(source.to_string()));
        }
    }
    if depth != 0 {
        return Err(ParseError::UnbalancedParens(source.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_keywords_and_atoms() {
        let tokens = tokenize("web* and not G@os:Ubuntu").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Expr("web*"),
                Token::And,
                Token::Not,
                Token::Expr("G@os:Ubuntu"),
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_not_a_keyword() {
        let tokens = tokenize("android or bsd").unwrap();
        assert_eq!(tokens, vec![Token::Expr("android"), Token::Or, Token::Expr("bsd")]);
    }

    #[test]
    fn paren_without_space_is_plain_atom() {
        let tokens = tokenize("(a) or b").unwrap();
        assert_eq!(tokens, vec![Token::Expr("(a)"), Token::Or, Token::Expr("b")]);
    }

    #[test]
    fn paren_with_space_is_sub_query() {
        let tokens = tokenize("not (G@bar:baz or toto)").unwrap();
        assert_eq!(tokens, vec![Token::Not, Token::SubQuery("G@bar:baz or toto")]);
    }

    #[test]
    fn balanced_check_catches_unclosed_paren() {
        assert!(check_balanced("(a or b").is_err());
        assert!(check_balanced("a or b)").is_err());
        assert!(check_balanced("(a or b)").is_ok());
    }
}
