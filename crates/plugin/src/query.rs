use crate::error::{PluginError, PluginResult};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use structscope_api::{LineIndex, QueryKind, Span};
use tree_sitter::{Node, Query};

/// Ordered map of the query kinds a plugin answers.
pub type QueryDefinitions = IndexMap<QueryKind, QueryDefinition>;

/// A grammar query plus the mapping from its captures to element fields.
///
/// Captures not listed in `fields` are exposed under their own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub pattern: Cow<'static, str>,
    pub fields: BTreeMap<String, String>,
    /// Tag the owning plugin uses to pick its post-processing step.
    pub postprocess: Option<Cow<'static, str>>,
}

impl QueryDefinition {
    pub fn new(pattern: impl Into<Cow<'static, str>>) -> Self {
        Self {
            pattern: pattern.into(),
            fields: BTreeMap::new(),
            postprocess: None,
        }
    }

    pub fn capture(mut self, capture: &str, field: &str) -> Self {
        self.fields.insert(capture.to_string(), field.to_string());
        self
    }

    pub fn postprocess(mut self, tag: impl Into<Cow<'static, str>>) -> Self {
        self.postprocess = Some(tag.into());
        self
    }

    pub fn postprocess_tag(&self) -> Option<&str> {
        self.postprocess.as_deref()
    }
}

/// A [`QueryDefinition`] compiled against its grammar.
pub struct CompiledQuery {
    pub kind: QueryKind,
    pub query: Query,
    /// Field name per capture index.
    fields: Vec<Arc<str>>,
}

impl CompiledQuery {
    /// Compiles `definition` and checks that every mapped capture exists.
    pub fn compile(
        grammar: &tree_sitter::Language,
        kind: &QueryKind,
        definition: &QueryDefinition,
    ) -> PluginResult<Self> {
        let query = Query::new(grammar, &definition.pattern).map_err(|e| {
            PluginError::InvalidQuery {
                kind: kind.clone(),
                message: format!("{:?}", e),
            }
        })?;

        for capture in definition.fields.keys() {
            if query.capture_index_for_name(capture).is_none() {
                return Err(PluginError::MissingCapture {
                    kind: kind.clone(),
                    capture: capture.clone(),
                });
            }
        }

        let fields = query
            .capture_names()
            .iter()
            .map(|name| {
                let field = definition
                    .fields
                    .get(*name)
                    .map(String::as_str)
                    .unwrap_or(*name);
                Arc::from(field)
            })
            .collect();

        Ok(Self {
            kind: kind.clone(),
            query,
            fields,
        })
    }

    pub fn capture_name(&self, index: u32) -> &str {
        self.query
            .capture_names()
            .get(index as usize)
            .copied()
            .unwrap_or("")
    }

    pub fn field_name(&self, index: u32) -> &str {
        self.fields.get(index as usize).map(|f| &**f).unwrap_or("")
    }
}

impl std::fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("kind", &self.kind)
            .field("captures", &self.query.capture_names())
            .field("fields", &self.fields)
            .finish()
    }
}

/// One captured node of a match.
#[derive(Debug, Clone)]
pub struct RawCapture<'a> {
    pub name: &'a str,
    pub field: &'a str,
    pub node: Node<'a>,
    pub byte_range: Range<usize>,
}

/// All captures of one pattern match, in capture order.
#[derive(Debug, Clone)]
pub struct RawMatch<'a> {
    pub pattern_index: usize,
    pub captures: Vec<RawCapture<'a>>,
}

impl<'a> RawMatch<'a> {
    pub fn field(&self, field: &str) -> Option<&RawCapture<'a>> {
        self.captures.iter().find(|c| c.field == field)
    }

    pub fn node(&self, field: &str) -> Option<Node<'a>> {
        self.field(field).map(|c| c.node)
    }
}

/// Source text handed to `extract`, with position conversion.
#[derive(Debug, Clone, Copy)]
pub struct SourceText<'a> {
    text: &'a str,
    lines: &'a LineIndex,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str, lines: &'a LineIndex) -> Self {
        Self { text, lines }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn text_of(&self, node: Node<'_>) -> &'a str {
        self.text.get(node.byte_range()).unwrap_or("")
    }

    /// 1-based, end-inclusive span of `node`.
    pub fn span(&self, node: Node<'_>) -> Span {
        self.lines.span(node.start_byte(), node.end_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn java() -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    #[test]
    fn test_compile_maps_fields() {
        let def = QueryDefinition::new("(class_declaration name: (identifier) @class.name) @def")
            .capture("class.name", "name");
        let compiled = CompiledQuery::compile(&java(), &QueryKind::CLASSES, &def).unwrap();
        let idx = compiled.query.capture_index_for_name("class.name").unwrap();
        assert_eq!(compiled.field_name(idx), "name");
        let def_idx = compiled.query.capture_index_for_name("def").unwrap();
        assert_eq!(compiled.field_name(def_idx), "def");
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let def = QueryDefinition::new("(no_such_node) @x");
        let err = CompiledQuery::compile(&java(), &QueryKind::CLASSES, &def).unwrap_err();
        assert!(matches!(err, PluginError::InvalidQuery { .. }));
    }

    #[test]
    fn test_compile_rejects_unknown_capture_mapping() {
        let def = QueryDefinition::new("(class_declaration) @def").capture("name", "name");
        let err = CompiledQuery::compile(&java(), &QueryKind::CLASSES, &def).unwrap_err();
        assert_eq!(
            err,
            PluginError::MissingCapture {
                kind: QueryKind::CLASSES,
                capture: "name".into()
            }
        );
    }
}
