//! The kind-agnostic expression tree a parsed query reduces to. Atoms stay
//! opaque `String`s here — binding an atom to a concrete rule kind is
//! `selector-engine`'s job, not the parser's.

/// A parsed selector expression. `All`/`Any` children are already flattened
/// (an `a and b and c` chain produces one 3-child `All`, not a nested
/// pair), matching the flattening the rule algebra itself applies to its
/// own combinators — the parser reproduces it one level up so the engine
/// doesn't have to re-derive associativity from a binary tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Atom(String),
    Not(Box<Expr>),
    All(Vec<Expr>),
    Any(Vec<Expr>),
}

impl Expr {
    pub fn atom(text: impl Into<String>) -> Self {
        Expr::Atom(text.into())
    }

    /// Negates `self`, collapsing `Not(Not(e))` back to `e` — the chained
    /// `--e` behavior a double `not not` prefix produces.
    pub fn negate(self) -> Self {
        match self {
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    pub fn and(self, rhs: Expr) -> Self {
        let mut children = Vec::new();
        flatten_into(true, self, &mut children);
        flatten_into(true, rhs, &mut children);
        Expr::All(children)
    }

    pub fn or(self, rhs: Expr) -> Self {
        let mut children = Vec::new();
        flatten_into(false, self, &mut children);
        flatten_into(false, rhs, &mut children);
        Expr::Any(children)
    }
}

fn flatten_into(is_and: bool, expr: Expr, out: &mut Vec<Expr>) {
    match (is_and, expr) {
        (true, Expr::All(children)) | (false, Expr::Any(children)) => out.extend(children),
        (_, other) => out.push(other),
    }
}
