use structscope_api::{CodeElement, ElementDetail, ElementKind, Span};
use structscope_plugin::utils::child_of_kind;
use structscope_plugin::{RawMatch, SourceText};
use tree_sitter::Node;

/// One element per imported name; `from m import *` yields a single
/// wildcard element.
pub(super) fn imports(m: &RawMatch<'_>, source: &SourceText<'_>) -> Vec<CodeElement> {
    let Some(stmt) = m.node("definition") else {
        return Vec::new();
    };
    let span = source.span(stmt);
    let module = stmt
        .child_by_field_name("module_name")
        .map(|n| source.text_of(n));

    if let Some(module) = module {
        if child_of_kind(stmt, "wildcard_import").is_some() {
            return vec![element(
                format!("{module}.*"),
                module.to_string(),
                None,
                true,
                span,
            )];
        }
    }

    let mut cursor = stmt.walk();
    stmt.children_by_field_name("name", &mut cursor)
        .filter_map(|name| {
            let (target, alias) = target(name, source)?;
            let path = match module {
                Some(m) if m.ends_with('.') => format!("{m}{target}"),
                Some(m) => format!("{m}.{target}"),
                None => target.to_string(),
            };
            Some(element(path.clone(), path, alias, false, span))
        })
        .collect()
}

fn target<'a>(name: Node<'_>, source: &SourceText<'a>) -> Option<(&'a str, Option<String>)> {
    match name.kind() {
        "aliased_import" => {
            let target = source.text_of(name.child_by_field_name("name")?);
            let alias = name
                .child_by_field_name("alias")
                .map(|a| source.text_of(a).to_string());
            Some((target, alias))
        }
        _ => Some((source.text_of(name), None)),
    }
}

fn element(
    name: String,
    path: String,
    alias: Option<String>,
    is_wildcard: bool,
    span: Span,
) -> CodeElement {
    CodeElement::new(ElementKind::Import, name, span).with_detail(ElementDetail::Import {
        path,
        alias,
        is_static: false,
        is_wildcard,
    })
}
