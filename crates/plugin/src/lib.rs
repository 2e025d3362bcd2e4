//! Plugin capability surface for structscope languages.

pub mod error;
pub mod plugin;
pub mod query;
pub mod registration;
pub mod utils;

pub use error::{PluginError, PluginResult};
pub use plugin::LanguagePlugin;
pub use query::{CompiledQuery, QueryDefinition, QueryDefinitions, RawCapture, RawMatch, SourceText};
pub use registration::{PluginFactory, PluginRegistration};
