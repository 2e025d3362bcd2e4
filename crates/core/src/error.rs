pub use structscope_api::{AnalysisError, ErrorKind};

pub type Result<T> = std::result::Result<T, AnalysisError>;

pub(crate) fn join_error(what: &str, err: tokio::task::JoinError) -> AnalysisError {
    AnalysisError::Internal(format!("{what} task failed: {err}"))
}
