use super::element::{CodeElement, ElementKind};
use super::language::Language;
use super::position::Span;
use super::query::QueryKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Elements returned for one analyzed unit, as handed to formatters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct StructureReport {
    pub path: String,
    pub language: Language,
    /// `None` when every supported query kind was run.
    pub query_kind: Option<QueryKind>,
    pub element_count: usize,
    pub elements: Vec<CodeElement>,
}

impl StructureReport {
    pub fn new(
        path: impl Into<String>,
        language: Language,
        query_kind: Option<QueryKind>,
        elements: Vec<CodeElement>,
    ) -> Self {
        Self {
            path: path.into(),
            language,
            query_kind,
            element_count: elements.len(),
            elements,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct CallableSize {
    pub name: String,
    pub kind: ElementKind,
    pub span: Span,
    pub lines: usize,
}

/// Size overview of a file, for deciding how to read it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ScaleReport {
    pub path: String,
    pub language: Language,
    pub bytes: usize,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub element_counts: BTreeMap<ElementKind, usize>,
    pub largest_callables: Vec<CallableSize>,
    pub is_large: bool,
    pub guidance: String,
}

/// A contiguous range of source lines.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct SectionExtract {
    pub path: String,
    pub requested_start: usize,
    pub requested_end: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub total_lines: usize,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
pub struct CacheCounters {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
pub struct CacheStats {
    pub parse: CacheCounters,
    pub results: CacheCounters,
}
