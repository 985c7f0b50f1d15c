use thiserror::Error;

/// The engine's error taxonomy: everything `selector-core`/`selector-parse`
/// can raise, plus the registry's own failure modes (`UnknownMacro`,
/// `Usage`; an evaluator's external failure arrives folded into
/// [`selector_core::Error::External`]).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Syntax(#[from] selector_parse::ParseError),

    #[error(transparent)]
    Core(#[from] selector_core::Error),

    #[error("node group `{0}` is not defined")]
    UnknownMacro(String),

    #[error("registry misuse: {0}")]
    Usage(String),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
