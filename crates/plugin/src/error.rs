use structscope_api::QueryKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("invalid query pattern for '{kind}': {message}")]
    InvalidQuery { kind: QueryKind, message: String },
    #[error("capture '@{capture}' mapped by '{kind}' does not exist in its pattern")]
    MissingCapture { kind: QueryKind, capture: String },
    #[error("no query definition for declared kind '{0}'")]
    MissingDefinition(QueryKind),
    #[error("grammar error: {0}")]
    Grammar(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
}

pub type PluginResult<T> = std::result::Result<T, PluginError>;
