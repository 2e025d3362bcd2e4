use super::position::Span;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Package,
    Import,
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
    Method,
    Constructor,
    Function,
    Field,
    EnumConstant,
    Variable,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Package => "package",
            ElementKind::Import => "import",
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Enum => "enum",
            ElementKind::Record => "record",
            ElementKind::Annotation => "annotation",
            ElementKind::Method => "method",
            ElementKind::Constructor => "constructor",
            ElementKind::Function => "function",
            ElementKind::Field => "field",
            ElementKind::EnumConstant => "enum_constant",
            ElementKind::Variable => "variable",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            ElementKind::Method | ElementKind::Constructor | ElementKind::Function
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
    /// Java package-private.
    Package,
    /// Conventionally internal (Python single underscore).
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Package => "package",
            Visibility::Internal => "internal",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a [`CodeElement`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, JsonSchema)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ElementDetail {
    Type {
        superclass: Option<String>,
        interfaces: Vec<String>,
        type_parameters: Option<String>,
    },
    Callable {
        return_type: Option<String>,
        parameters: Vec<String>,
        throws: Vec<String>,
        is_async: bool,
    },
    Variable {
        type_name: Option<String>,
        value: Option<String>,
    },
    Import {
        path: String,
        alias: Option<String>,
        is_static: bool,
        is_wildcard: bool,
    },
    Package {
        path: String,
    },
    #[default]
    None,
}

/// One extracted structural unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct CodeElement {
    pub kind: ElementKind,
    pub name: String,
    pub span: Span,
    pub visibility: Visibility,
    pub modifiers: Vec<String>,
    /// Dotted path of the enclosing types, e.g. `Outer.Inner`.
    pub container: Option<String>,
    pub detail: ElementDetail,
    /// Language-specific extras, kept ordered for stable output.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl CodeElement {
    pub fn new(kind: ElementKind, name: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            span,
            visibility: Visibility::default(),
            modifiers: Vec::new(),
            container: None,
            detail: ElementDetail::None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<String>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_container(mut self, container: Option<String>) -> Self {
        self.container = container;
        self
    }

    pub fn with_detail(mut self, detail: ElementDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Name qualified by its container, e.g. `Outer.Inner.run`.
    pub fn qualified_name(&self) -> String {
        match &self.container {
            Some(c) => format!("{}.{}", c, self.name),
            None => self.name.clone(),
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}
