use structscope_api::{CodeElement, ElementDetail, ElementKind};
use structscope_plugin::utils::named_children;
use structscope_plugin::{RawMatch, SourceText};
use tree_sitter::Node;

fn qualified_name<'a>(decl: Node<'a>) -> Option<Node<'a>> {
    named_children(decl)
        .into_iter()
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
}

pub(super) fn import(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    let path = source.text_of(qualified_name(decl)?).to_string();

    let mut is_static = false;
    let mut is_wildcard = false;
    let mut cursor = decl.walk();
    for child in decl.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "asterisk" => is_wildcard = true,
            _ => {}
        }
    }

    let name = if is_wildcard {
        format!("{path}.*")
    } else {
        path.clone()
    };
    let mut element = CodeElement::new(ElementKind::Import, name, source.span(decl)).with_detail(
        ElementDetail::Import {
            path,
            alias: None,
            is_static,
            is_wildcard,
        },
    );
    if is_static {
        element = element.with_modifiers(vec!["static".to_string()]);
    }
    Some(element)
}

pub(super) fn package(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    let path = source.text_of(qualified_name(decl)?).to_string();
    Some(
        CodeElement::new(ElementKind::Package, path.clone(), source.span(decl))
            .with_detail(ElementDetail::Package { path }),
    )
}
