use crate::models::{Language, QueryKind};
use serde::Serialize;
use std::path::PathBuf;

/// Every failure the analysis engine can report.
///
/// The type is `Clone` so one in-flight computation can hand the same outcome
/// to all of its waiters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Security violation: '{path}' is outside project root '{}' ({reason})", root.display())]
    SecurityViolation {
        path: String,
        root: PathBuf,
        reason: String,
    },
    #[error("Unsupported language: {language}")]
    UnsupportedLanguage { language: String },
    #[error("Unsupported query '{query_kind}' for language {language}")]
    UnsupportedQuery {
        language: Language,
        query_kind: QueryKind,
    },
    #[error("Failed to parse {language} source: {reason}")]
    ParseFailure { language: Language, reason: String },
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout { operation: String, after_ms: u64 },
    #[error("Failed to initialize plugin for {language}: {cause}")]
    PluginInitialization { language: String, cause: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },
    #[error("Engine is shut down")]
    EngineShutdown,
    #[error("Analysis of {unit}{} failed: {message}", query_kind.as_ref().map(|k| format!(" ({k})")).unwrap_or_default())]
    Unexpected {
        unit: String,
        query_kind: Option<QueryKind>,
        message: String,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::SecurityViolation { .. } => ErrorKind::SecurityViolation,
            AnalysisError::UnsupportedLanguage { .. } => ErrorKind::UnsupportedLanguage,
            AnalysisError::UnsupportedQuery { .. } => ErrorKind::UnsupportedQuery,
            AnalysisError::ParseFailure { .. } => ErrorKind::ParseFailure,
            AnalysisError::Timeout { .. } => ErrorKind::Timeout,
            AnalysisError::PluginInitialization { .. } => ErrorKind::PluginInitialization,
            AnalysisError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AnalysisError::Io { .. } => ErrorKind::Io,
            AnalysisError::EngineShutdown => ErrorKind::EngineShutdown,
            AnalysisError::Unexpected { .. } | AnalysisError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn unsupported_language(language: impl Into<String>) -> Self {
        AnalysisError::UnsupportedLanguage {
            language: language.into(),
        }
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Errors the engine knows how to report as-is. Anything else is wrapped
    /// with source-unit context before it leaves the orchestrator.
    pub fn is_expected(&self) -> bool {
        !matches!(self, AnalysisError::Internal(_))
    }
}

/// Stable classification for front ends (exit codes, structured payloads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SecurityViolation,
    UnsupportedLanguage,
    UnsupportedQuery,
    ParseFailure,
    Timeout,
    PluginInitialization,
    InvalidArgument,
    Io,
    EngineShutdown,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SecurityViolation => "security_violation",
            ErrorKind::UnsupportedLanguage => "unsupported_language",
            ErrorKind::UnsupportedQuery => "unsupported_query",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::PluginInitialization => "plugin_initialization",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Io => "io",
            ErrorKind::EngineShutdown => "engine_shutdown",
            ErrorKind::Internal => "internal",
        }
    }

    /// Whether retrying the same call later may succeed without any change
    /// on the caller's side.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::PluginInitialization | ErrorKind::Io
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::InvalidArgument => 2,
            ErrorKind::SecurityViolation => 3,
            ErrorKind::UnsupportedLanguage => 4,
            ErrorKind::UnsupportedQuery => 5,
            ErrorKind::ParseFailure => 6,
            ErrorKind::Timeout => 7,
            ErrorKind::PluginInitialization => 8,
            ErrorKind::Io => 9,
            ErrorKind::EngineShutdown => 10,
            ErrorKind::Internal => 1,
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_message_includes_context() {
        let err = AnalysisError::Unexpected {
            unit: "src/A.java".into(),
            query_kind: Some(QueryKind::METHODS),
            message: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "Analysis of src/A.java (methods) failed: boom"
        );
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::SecurityViolation.is_retryable());
        assert!(!ErrorKind::UnsupportedQuery.is_retryable());
    }
}
