//! Shared analysis machinery: registry, caches, query execution and the
//! engine that ties them together behind one entry point per project root.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod logging;
pub mod parser;
pub mod query;
pub mod registry;
pub mod scale;
pub mod section;
pub mod security;

pub use config::{EngineConfig, detect_project_root};
pub use engine::{AnalysisEngine, AnalysisEngineBuilder, EngineState};
pub use error::Result;
pub use format::OutputFormat;
pub use parser::{SyntaxParser, SyntaxTree, TreeSitterParser};
pub use registry::{LanguageRegistry, LoadedPlugin};
pub use security::SecurityBoundary;
