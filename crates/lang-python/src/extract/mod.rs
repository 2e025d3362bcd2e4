//! Turns raw query matches into [`CodeElement`]s.

mod assignments;
mod defs;
mod imports;

use crate::queries;
use structscope_api::{CodeElement, QueryKind, Visibility};
use structscope_plugin::utils::{child_of_kind, compact, named_children};
use structscope_plugin::{PluginError, PluginResult, QueryDefinitions, RawMatch, SourceText};
use tree_sitter::Node;

/// Definitions that contribute a segment to an element's container.
const SCOPES: &[&str] = &["class_definition", "function_definition"];

const MAX_VALUE_LEN: usize = 120;

pub(crate) fn extract(
    definitions: &QueryDefinitions,
    kind: &QueryKind,
    matches: &[RawMatch<'_>],
    source: &SourceText<'_>,
) -> PluginResult<Vec<CodeElement>> {
    let tag = definitions
        .get(kind)
        .and_then(|d| d.postprocess_tag())
        .ok_or_else(|| PluginError::MissingDefinition(kind.clone()))?;

    let mut out = Vec::with_capacity(matches.len());
    for m in matches {
        match tag {
            queries::TYPES => out.extend(defs::class(m, source)),
            queries::FUNCTIONS => out.extend(defs::callable(m, source, false)),
            queries::METHODS => out.extend(defs::callable(m, source, true)),
            queries::FIELDS => out.extend(assignments::field(m, source)),
            queries::VARIABLES => out.extend(assignments::variable(m, source)),
            queries::IMPORTS => out.extend(imports::imports(m, source)),
            other => {
                return Err(PluginError::Extraction(format!(
                    "unknown post-process tag '{other}'"
                )));
            }
        }
    }
    tracing::trace!(%kind, matches = matches.len(), elements = out.len(), "Extracted");
    Ok(out)
}

/// Dotted path of the classes and functions enclosing `node`.
pub(crate) fn container(node: Node<'_>, source: &SourceText<'_>) -> Option<String> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(n) = current {
        if SCOPES.contains(&n.kind()) {
            if let Some(name) = n.child_by_field_name("name") {
                names.push(source.text_of(name));
            }
        }
        current = n.parent();
    }
    if names.is_empty() {
        return None;
    }
    names.reverse();
    Some(names.join("."))
}

/// `__name` is private, `_name` internal; dunder names stay public.
pub(crate) fn visibility_of(name: &str) -> Visibility {
    if name.len() > 4 && name.starts_with("__") && name.ends_with("__") {
        Visibility::Public
    } else if name.starts_with("__") {
        Visibility::Private
    } else if name.starts_with('_') {
        Visibility::Internal
    } else {
        Visibility::Public
    }
}

/// The `decorated_definition` wrapping `decl`, if any, else `decl` itself.
pub(crate) fn outer(decl: Node<'_>) -> Node<'_> {
    match decl.parent() {
        Some(p) if p.kind() == "decorated_definition" => p,
        _ => decl,
    }
}

pub(crate) fn decorators(decl: Node<'_>, source: &SourceText<'_>) -> Vec<String> {
    let wrapper = outer(decl);
    if wrapper == decl {
        return Vec::new();
    }
    named_children(wrapper)
        .into_iter()
        .filter(|n| n.kind() == "decorator")
        .map(|n| compact(source.text_of(n)))
        .collect()
}

/// First line of the docstring opening `body`.
pub(crate) fn docstring(body: Node<'_>, source: &SourceText<'_>) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string = first.named_child(0).filter(|n| n.kind() == "string")?;
    let content = child_of_kind(string, "string_content")?;
    source
        .text_of(content)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(truncate)
}

pub(crate) fn truncate(text: &str) -> String {
    let text = compact(text);
    if text.len() <= MAX_VALUE_LEN {
        return text;
    }
    let mut end = MAX_VALUE_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
