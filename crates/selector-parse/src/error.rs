use thiserror::Error;

/// Everything that can go wrong tokenizing or parsing a selector query.
/// Corresponds to the `SyntaxError` kind in the engine's error taxonomy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("query `{0}` is empty")]
    EmptyQuery(String),

    #[error("unexpected operator at the end of `{0}`")]
    TrailingOperator(String),

    #[error("statement missing before expression `{token}` in `{query}`")]
    MissingOperator { query: String, token: String },

    #[error("unbalanced parentheses in `{0}`")]
    UnbalancedParens(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
