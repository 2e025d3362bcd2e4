use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::query::QueryKind;

/// Programming language identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Language(Cow<'static, str>);

impl Language {
    pub const JAVA: Language = Language(Cow::Borrowed("java"));
    pub const PYTHON: Language = Language(Cow::Borrowed("python"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Self::new(s.to_ascii_lowercase())
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Self::new(s.to_ascii_lowercase())
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Static description of a language, known before its plugin is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageDescriptor {
    pub language: Language,
    pub display_name: String,
    /// File extensions without the leading dot, lowercase.
    pub extensions: Vec<String>,
    /// Extra names accepted by `resolve` (e.g. "py" for python).
    pub aliases: Vec<String>,
    /// Query kinds in the order the plugin declares them.
    pub query_kinds: Vec<QueryKind>,
    /// Name of the tree-sitter grammar backing the plugin.
    pub grammar: String,
}

impl LanguageDescriptor {
    pub fn new(language: Language, display_name: impl Into<String>) -> Self {
        Self {
            language,
            display_name: display_name.into(),
            extensions: Vec::new(),
            aliases: Vec::new(),
            query_kinds: Vec::new(),
            grammar: String::new(),
        }
    }

    pub fn with_extensions(mut self, exts: &[&str]) -> Self {
        self.extensions = exts
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_ascii_lowercase()).collect();
        self
    }

    pub fn with_query_kinds(mut self, kinds: &[QueryKind]) -> Self {
        self.query_kinds = kinds.to_vec();
        self
    }

    pub fn with_grammar(mut self, grammar: impl Into<String>) -> Self {
        self.grammar = grammar.into();
        self
    }

    /// True when `key` names this language, one of its aliases, or one of its
    /// extensions (with or without the leading dot). Case-insensitive.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return false;
        }
        if self.language.as_str() == key || self.aliases.iter().any(|a| *a == key) {
            return true;
        }
        let ext = key.trim_start_matches('.');
        self.extensions.iter().any(|e| e == ext)
    }

    pub fn handles_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        self.extensions.iter().any(|e| *e == ext)
    }
}
