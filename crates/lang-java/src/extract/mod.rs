//! Turns raw query matches into [`CodeElement`]s.

mod imports;
mod members;
mod types;

use crate::queries;
use structscope_api::{CodeElement, QueryKind, Visibility};
use structscope_plugin::utils::{child_of_kind, compact};
use structscope_plugin::{PluginError, PluginResult, QueryDefinitions, RawMatch, SourceText};
use tree_sitter::Node;

pub(crate) const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const INTERFACE_BODIES: &[&str] = &["interface_body", "annotation_type_body"];

/// Longest initializer kept verbatim on a field element.
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
        let element = match tag {
            queries::TYPES => types::type_declaration(m, source),
            queries::CALLABLES => members::callable(m, source),
            queries::FIELDS => members::field(m, source),
            queries::IMPORTS => imports::import(m, source),
            queries::PACKAGE => imports::package(m, source),
            other => {
                return Err(PluginError::Extraction(format!(
                    "unknown post-process tag '{other}'"
                )));
            }
        };
        match element {
            Some(e) => out.push(e),
            None => tracing::debug!(%kind, pattern = m.pattern_index, "Skipping incomplete match"),
        }
    }
    Ok(out)
}

/// Dotted path of the named types enclosing `node`, outermost first.
/// Anonymous class bodies are skipped.
pub(crate) fn container(node: Node<'_>, source: &SourceText<'_>) -> Option<String> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(n) = current {
        if TYPE_DECLARATIONS.contains(&n.kind()) {
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

/// Keywords and annotations from the `modifiers` child, plus the visibility
/// they imply. Access keywords only feed the visibility.
pub(crate) fn modifiers(decl: Node<'_>, source: &SourceText<'_>) -> (Vec<String>, Option<Visibility>) {
    let Some(mods) = child_of_kind(decl, "modifiers") else {
        return (Vec::new(), None);
    };
    let mut list = Vec::new();
    let mut visibility = None;
    let mut cursor = mods.walk();
    for child in mods.children(&mut cursor) {
        match child.kind() {
            "public" => visibility = Some(Visibility::Public),
            "protected" => visibility = Some(Visibility::Protected),
            "private" => visibility = Some(Visibility::Private),
            "marker_annotation" | "annotation" => list.push(compact(source.text_of(child))),
            "line_comment" | "block_comment" => {}
            _ => list.push(source.text_of(child).to_string()),
        }
    }
    (list, visibility)
}

/// Members of interfaces and annotation types are implicitly public;
/// everything else defaults to package-private.
pub(crate) fn default_visibility(decl: Node<'_>) -> Visibility {
    match decl.parent() {
        Some(p) if INTERFACE_BODIES.contains(&p.kind()) => Visibility::Public,
        _ => Visibility::Package,
    }
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
