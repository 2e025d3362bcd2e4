//! Java support: classes, methods, fields, imports and the package clause.

mod extract;
pub mod queries;
pub mod registration;

pub use registration::{descriptor, registration};

use structscope_api::{CodeElement, Language, QueryKind};
use structscope_plugin::{LanguagePlugin, PluginResult, QueryDefinitions, RawMatch, SourceText};

pub struct JavaPlugin {
    definitions: QueryDefinitions,
}

impl JavaPlugin {
    pub fn new() -> Self {
        Self {
            definitions: queries::definitions(),
        }
    }
}

impl Default for JavaPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for JavaPlugin {
    fn language(&self) -> Language {
        Language::JAVA
    }

    fn extensions(&self) -> &[&str] {
        registration::EXTENSIONS
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn query_definitions(&self) -> &QueryDefinitions {
        &self.definitions
    }

    fn comment_node_kinds(&self) -> &[&str] {
        &["line_comment", "block_comment"]
    }

    fn extract(
        &self,
        kind: &QueryKind,
        matches: &[RawMatch<'_>],
        source: &SourceText<'_>,
    ) -> PluginResult<Vec<CodeElement>> {
        extract::extract(&self.definitions, kind, matches, source)
    }
}
