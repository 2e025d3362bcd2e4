//! Shared data model and error taxonomy for structscope.

pub mod error;
pub mod models;

pub use error::{AnalysisError, AnalysisResult, ErrorKind};
pub use models::*;
