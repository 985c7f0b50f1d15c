use thiserror::Error;

/// Errors raised while building or evaluating a [`crate::rule::Rule`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed expression `{expr}`: {reason}")]
    MalformedExpression { expr: String, reason: String },

    #[error("range provider failed for `{expr}`: {source}")]
    External {
        expr: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
