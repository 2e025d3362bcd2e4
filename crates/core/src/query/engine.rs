use crate::error::{AnalysisError, Result};
use crate::parser::SyntaxTree;
use crate::registry::LoadedPlugin;
use std::time::Instant;
use structscope_api::{CodeElement, LineIndex, QueryKind};
use structscope_plugin::{RawCapture, RawMatch, SourceText};
use tree_sitter::{QueryCursor, StreamingIterator};

/// Matches between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Runs a plugin's compiled query over a tree and hands the matches to the
/// plugin for extraction. Holds no per-language logic.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryExecutionEngine;

impl QueryExecutionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn run(
        &self,
        plugin: &LoadedPlugin,
        tree: &SyntaxTree,
        kind: &QueryKind,
        source: &str,
        deadline: Option<Instant>,
    ) -> Result<Vec<CodeElement>> {
        let compiled = plugin.query(kind)?;
        if tree.language() != plugin.language() {
            return Err(AnalysisError::Internal(format!(
                "{} tree handed to {} query",
                tree.language(),
                plugin.language()
            )));
        }

        let started = Instant::now();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&compiled.query, tree.root_node(), source.as_bytes());

        let mut raw = Vec::new();
        while let Some(m) = matches.next() {
            if raw.len() % DEADLINE_CHECK_INTERVAL == 0 {
                check_deadline(deadline, kind, started)?;
            }
            let captures = m
                .captures
                .iter()
                .map(|c| RawCapture {
                    name: compiled.capture_name(c.index),
                    field: compiled.field_name(c.index),
                    node: c.node,
                    byte_range: c.node.byte_range(),
                })
                .collect();
            raw.push(RawMatch {
                pattern_index: m.pattern_index,
                captures,
            });
        }
        check_deadline(deadline, kind, started)?;

        let lines = LineIndex::new(source);
        let text = SourceText::new(source, &lines);
        let mut elements = plugin
            .plugin()
            .extract(kind, &raw, &text)
            .map_err(|e| AnalysisError::Internal(format!("{} extraction failed: {}", plugin.language(), e)))?;
        elements.sort_by_key(|e| (e.span.start_line, e.span.start_column));

        tracing::debug!(
            "{} '{}' query: {} matches, {} elements in {:?}",
            plugin.language(),
            kind,
            raw.len(),
            elements.len(),
            started.elapsed()
        );
        Ok(elements)
    }
}

fn check_deadline(deadline: Option<Instant>, kind: &QueryKind, started: Instant) -> Result<()> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(AnalysisError::Timeout {
            operation: format!("'{kind}' query"),
            after_ms: started.elapsed().as_millis() as u64,
        }),
        _ => Ok(()),
    }
}
