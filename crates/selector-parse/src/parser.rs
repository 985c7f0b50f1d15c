//! A 3-state pushdown parser over the token stream from [`crate::token`]:
//! recursive descent for parenthesized sub-queries, an explicit state enum
//! for the infix `and`/`or` reducer. No string-`eval` anywhere in the
//! pipeline — every operator is matched structurally.

use crate::ast::Expr;
use crate::error::{ParseError, Result};
use crate::token::{check_balanced, tokenize, Token};

/// Parses a full selector query into an [`Expr`] tree. Whitespace is
/// normalized implicitly by the tokenizer (runs are skipped, not
/// collapsed into tokens); per-atom normalization (trimming, collapsing
/// interior runs inside a coalesced multi-word atom) is the caller's
/// responsibility — `selector-engine`'s registry applies it right before
/// binding an atom to a rule kind.
pub fn parse(query: &str) -> Result<Expr> {
    check_balanced(query)?;
    let tokens = tokenize(query)?;
    parse_tokens(query, &tokens)
}

/// Expects an operand: an atom, a negated operand, or a sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Operand,
    /// Just closed a sub-query; only `and`/`or` are valid next.
    AfterGroup,
    /// Just consumed a bare atom; `and`/`or` are valid, and so is another
    /// atom token, which coalesces into the same atom (multi-word values).
    AfterAtom,
}

enum Item {
    Operand(Expr),
    And,
    Or,
}

fn parse_tokens(source: &str, tokens: &[Token<'_>]) -> Result<Expr> {
    let mut items: Vec<Item> = Vec::new();
    let mut state = State::Operand;
    let mut pending_negations = 0u32;

    for token in tokens {
        match (state, token) {
            (State::Operand, Token::Not) => {
                pending_negations += 1;
            }
            (State::Operand, Token::SubQuery(inner)) => {
                let mut expr = parse(inner)?;
                if pending_negations % 2 == 1 {
                    expr = expr.negate();
                }
                pending_negations = 0;
                items.push(Item::Operand(expr));
                state = State::AfterGroup;
            }
            (State::Operand, Token::Expr(text)) => {
                let mut expr = Expr::atom(*text);
                if pending_negations % 2 == 1 {
                    expr = expr.negate();
                }
                pending_negations = 0;
                items.push(Item::Operand(expr));
                state = State::AfterAtom;
            }
            (State::Operand, Token::And | Token::Or) => {
                return Err(ParseError::MissingOperator {
                    query: source.to_string(),
                    token: format!("{token:?}"),
                });
            }
            (State::AfterGroup | State::AfterAtom, Token::And) => {
                items.push(Item::And);
                state = State::Operand;
            }
            (State::AfterGroup | State::AfterAtom, Token::Or) => {
                items.push(Item::Or);
                state = State::Operand;
            }
            (State::AfterAtom, Token::Expr(text)) => {
                coalesce(&mut items, text);
            }
            (State::AfterGroup, Token::Expr(text)) => {
                return Err(ParseError::MissingOperator {
                    query: source.to_string(),
                    token: (*text).to_string(),
                });
            }
            (_, Token::SubQuery(inner)) => {
                return Err(ParseError::MissingOperator {
                    query: source.to_string(),
                    token: format!("({inner})"),
                });
            }
            (_, Token::Not) => {
                return Err(ParseError::MissingOperator {
                    query: source.to_string(),
                    token: "not".to_string(),
                });
            }
        }
    }

    if items.is_empty() {
        return Err(ParseError::EmptyQuery(source.to_string()));
    }
    if matches!(state, State::Operand) {
        // Either a trailing `and`/`or`, or a trailing `not` with nothing
        // after it — both are "operator with no following operand".
        return Err(ParseError::TrailingOperator(source.to_string()));
    }

    reduce(items)
}

/// Merges a second consecutive atom token into the previous one, joined by
/// a single space — this is what makes `I@fullname:John Doe` parse as one
/// atom instead of two.
fn coalesce(items: &mut [Item], text: &str) {
    if let Some(Item::Operand(Expr::Atom(prev))) = items.last_mut() {
        prev.push(' ');
        prev.push_str(text);
    } else if let Some(Item::Operand(Expr::Not(inner))) = items.last_mut() {
        if let Expr::Atom(prev) = inner.as_mut() {
            prev.push(' ');
            prev.push_str(text);
        }
    }
}

/// Left-to-right reduction with `and`/`or` at equal precedence (per the
/// REDESIGN FLAGS: the original relies on host-language operator
/// precedence via `eval`; this reducer makes the equal-precedence,
/// left-associative semantics explicit instead).
fn reduce(items: Vec<Item>) -> Result<Expr> {
    let mut iter = items.into_iter();
    let mut acc = match iter.next() {
        Some(Item::Operand(expr)) => expr,
        _ => unreachable!("first item is always an operand after a successful parse"),
    };
    loop {
        let op = match iter.next() {
            Some(Item::And) => true,
            Some(Item::Or) => false,
            Some(Item::Operand(_)) => unreachable!("operands always follow an operator"),
            None => break,
        };
        let rhs = match iter.next() {
            Some(Item::Operand(expr)) => expr,
            _ => unreachable!("operator is always followed by an operand after a successful parse"),
        };
        acc = if op { acc.and(rhs) } else { acc.or(rhs) };
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_only() {
        assert_eq!(parse("web*").unwrap(), Expr::atom("web*"));
    }

    #[test]
    fn compound_with_negated_group() {
        let expr = parse("not (G@bar:baz or toto)").unwrap();
        assert_eq!(
            expr,
            Expr::atom("G@bar:baz").or(Expr::atom("toto")).negate()
        );
    }

    #[test]
    fn multiword_atom_coalesces() {
        let expr = parse("*.example.com and not (I@fullname:John Doe or D@role:web)").unwrap();
        match expr {
            Expr::All(children) => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[0], Expr::atom("*.example.com"));
                match &children[1] {
                    Expr::Not(inner) => match inner.as_ref() {
                        Expr::Any(any_children) => {
                            assert_eq!(any_children[0], Expr::atom("I@fullname:John Doe"));
                            assert_eq!(any_children[1], Expr::atom("D@role:web"));
                        }
                        other => panic!("expected Any, got {other:?}"),
                    },
                    other => panic!("expected Not, got {other:?}"),
                }
            }
            other => panic!("expected All, got {other:?}"),
        }
    }

    #[test]
    fn trailing_operator_is_a_syntax_error() {
        assert!(matches!(parse("G@foo:bar and "), Err(ParseError::TrailingOperator(_))));
    }

    #[test]
    fn trailing_not_is_a_syntax_error() {
        assert!(matches!(parse("a and not"), Err(ParseError::TrailingOperator(_))));
    }

    #[test]
    fn missing_operator_is_a_syntax_error() {
        assert!(matches!(parse("(a b) c"), Err(ParseError::MissingOperator { .. })));
    }

    #[test]
    fn and_or_are_equal_precedence_left_associative() {
        // a and b or c  =>  (a and b) or c, not a and (b or c)
        let expr = parse("a and b or c").unwrap();
        match expr {
            Expr::Any(children) => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[0], Expr::atom("a").and(Expr::atom("b")));
                assert_eq!(children[1], Expr::atom("c"));
            }
            other => panic!("expected Any, got {other:?}"),
        }
    }

    #[test]
    fn chained_and_flattens() {
        let expr = parse("a and b and c").unwrap();
        match expr {
            Expr::All(children) => assert_eq!(children.len(), 3),
            other => panic!("expected All, got {other:?}"),
        }
    }

    #[test]
    fn double_negation_collapses() {
        assert_eq!(parse("not not web*").unwrap(), Expr::atom("web*"));
    }

    #[test]
    fn unbalanced_parens_error() {
        assert!(parse("(a or b").is_err());
    }
}
