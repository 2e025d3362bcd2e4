//! Python support: classes, functions, methods, class fields, imports and
//! module-level variables.

mod extract;
pub mod queries;
pub mod registration;

pub use registration::{descriptor, registration};

use structscope_api::{CodeElement, Language, QueryKind};
use structscope_plugin::{LanguagePlugin, PluginResult, QueryDefinitions, RawMatch, SourceText};

pub struct PythonPlugin {
    definitions: QueryDefinitions,
}

impl PythonPlugin {
    pub fn new() -> Self {
        Self {
            definitions: queries::definitions(),
        }
    }
}

impl Default for PythonPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for PythonPlugin {
    fn language(&self) -> Language {
        Language::PYTHON
    }

    fn extensions(&self) -> &[&str] {
        registration::EXTENSIONS
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn query_definitions(&self) -> &QueryDefinitions {
        &self.definitions
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
