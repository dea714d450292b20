use thiserror::Error;

/// Errors surfaced by the analyzer. All of them are fatal for the whole
/// analysis run; the only lenient path is an unresolved attribute with zero
/// candidates, which stays in the plan until the post-analysis checks turn
/// it into [`AnalysisError::ResolutionFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("table or view not found: {0}")]
    TableNotFound(String),

    #[error("undefined function: {0}")]
    FunctionNotFound(String),

    #[error("{0}")]
    ResolutionFailure(String),

    #[error("cannot resolve {expr} due to data type mismatch: found {actual}, requires {expected}")]
    TypeMismatch {
        expr: String,
        actual: String,
        expected: String,
    },

    #[error("{0}")]
    IllegalAggregation(String),

    #[error("{0}")]
    AnalysisException(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

impl AnalysisError {
    pub fn analysis(msg: impl Into<String>) -> Self {
        AnalysisError::AnalysisException(msg.into())
    }

    pub fn resolution(msg: impl Into<String>) -> Self {
        AnalysisError::ResolutionFailure(msg.into())
    }
}
