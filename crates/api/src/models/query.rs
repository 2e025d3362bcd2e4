use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A named category of structural query, e.g. "methods" or "imports".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct QueryKind(Cow<'static, str>);

impl QueryKind {
    pub const CLASSES: QueryKind = QueryKind(Cow::Borrowed("classes"));
    pub const METHODS: QueryKind = QueryKind(Cow::Borrowed("methods"));
    pub const FUNCTIONS: QueryKind = QueryKind(Cow::Borrowed("functions"));
    pub const FIELDS: QueryKind = QueryKind(Cow::Borrowed("fields"));
    pub const IMPORTS: QueryKind = QueryKind(Cow::Borrowed("imports"));
    pub const PACKAGE: QueryKind = QueryKind(Cow::Borrowed("package"));
    pub const VARIABLES: QueryKind = QueryKind(Cow::Borrowed("variables"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryKind {
    fn from(s: &str) -> Self {
        Self::new(s.trim().to_ascii_lowercase())
    }
}

impl From<String> for QueryKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl AsRef<str> for QueryKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
