//! Line statistics and size overview for `check_scale`.

use crate::parser::SyntaxTree;
use std::collections::BTreeMap;
use structscope_api::{CallableSize, CodeElement, LineIndex, ScaleReport, SourceUnit};
use tree_sitter::Node;

const LARGEST_CALLABLES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub total: usize,
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
}

/// Classifies every line as code, comment-only or blank.
///
/// A line holding any non-comment token counts as code, even with a
/// trailing comment.
pub fn count_lines(text: &str, tree: &SyntaxTree, comment_kinds: &[&str]) -> LineCounts {
    let lines = LineIndex::new(text);
    let total = lines.line_count();
    let mut code = vec![false; total + 1];
    let mut comment = vec![false; total + 1];
    mark_lines(tree.root_node(), &lines, comment_kinds, &mut code, &mut comment);

    let mut counts = LineCounts {
        total,
        ..Default::default()
    };
    for line in 1..=total {
        let blank = lines
            .line_range(text, line)
            .and_then(|r| text.get(r))
            .is_none_or(|l| l.trim().is_empty());
        if code[line] {
            counts.code += 1;
        } else if comment[line] {
            counts.comment += 1;
        } else if blank {
            counts.blank += 1;
        } else {
            counts.code += 1;
        }
    }
    counts
}

/// Walks the tree with a cursor so nesting depth never grows the stack.
fn mark_lines(
    root: Node<'_>,
    lines: &LineIndex,
    comment_kinds: &[&str],
    code: &mut [bool],
    comment: &mut [bool],
) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        let descend = if comment_kinds.contains(&node.kind()) {
            mark(lines, node, comment);
            false
        } else if node.child_count() == 0 {
            if node.end_byte() > node.start_byte() {
                mark(lines, node, code);
            }
            false
        } else {
            true
        };
        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn mark(lines: &LineIndex, node: Node<'_>, flags: &mut [bool]) {
    let span = lines.span(node.start_byte(), node.end_byte());
    for line in span.start_line..=span.end_line.min(flags.len().saturating_sub(1)) {
        flags[line] = true;
    }
}

pub fn build_report(
    path: &str,
    unit: &SourceUnit,
    tree: &SyntaxTree,
    comment_kinds: &[&str],
    elements: &[CodeElement],
    large_file_lines: usize,
) -> ScaleReport {
    let text = unit.text();
    let counts = count_lines(text, tree, comment_kinds);

    let mut element_counts = BTreeMap::new();
    for e in elements {
        *element_counts.entry(e.kind).or_insert(0) += 1;
    }

    let mut largest: Vec<CallableSize> = elements
        .iter()
        .filter(|e| e.kind.is_callable())
        .map(|e| CallableSize {
            name: e.qualified_name(),
            kind: e.kind,
            span: e.span,
            lines: e.span.line_count(),
        })
        .collect();
    largest.sort_by(|a, b| {
        b.lines
            .cmp(&a.lines)
            .then(a.span.start_line.cmp(&b.span.start_line))
    });
    largest.truncate(LARGEST_CALLABLES);

    let is_large = counts.total > large_file_lines;
    let guidance = if is_large {
        format!(
            "Large file ({} lines). Use analyze_code_structure to locate the elements you need, \
             then extract_code_section to read only their line ranges.",
            counts.total
        )
    } else {
        format!("Small file ({} lines). It can be read in full.", counts.total)
    };

    ScaleReport {
        path: path.to_string(),
        language: unit.language().clone(),
        bytes: text.len(),
        total_lines: counts.total,
        code_lines: counts.code,
        comment_lines: counts.comment,
        blank_lines: counts.blank,
        element_counts,
        largest_callables: largest,
        is_large,
        guidance,
    }
}
