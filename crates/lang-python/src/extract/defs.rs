use super::{container, decorators, docstring, outer, truncate, visibility_of};
use structscope_api::{CodeElement, ElementDetail, ElementKind};
use structscope_plugin::utils::{child_of_kind, compact, named_children};
use structscope_plugin::{RawMatch, SourceText};
use tree_sitter::Node;

pub(super) fn class(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    let name = source.text_of(m.node("name")?);

    let mut bases = Vec::new();
    let mut keywords = Vec::new();
    if let Some(args) = decl.child_by_field_name("superclasses") {
        for arg in named_children(args) {
            match arg.kind() {
                "keyword_argument" => {
                    let key = arg.child_by_field_name("name").map(|n| source.text_of(n));
                    let value = arg.child_by_field_name("value").map(|n| source.text_of(n));
                    if let (Some(key), Some(value)) = (key, value) {
                        keywords.push((key.to_string(), truncate(value)));
                    }
                }
                "comment" => {}
                _ => bases.push(compact(source.text_of(arg))),
            }
        }
    }
    let mut bases = bases.into_iter();
    let superclass = bases.next();
    let type_parameters = decl
        .child_by_field_name("type_parameters")
        .map(|t| compact(source.text_of(t)));

    let mut element = CodeElement::new(ElementKind::Class, name, source.span(outer(decl)))
        .with_visibility(visibility_of(name))
        .with_modifiers(decorators(decl, source))
        .with_container(container(decl, source))
        .with_detail(ElementDetail::Type {
            superclass,
            interfaces: bases.collect(),
            type_parameters,
        });
    for (key, value) in keywords {
        element = element.with_attribute(key, value);
    }
    if let Some(doc) = decl.child_by_field_name("body").and_then(|b| docstring(b, source)) {
        element = element.with_attribute("docstring", doc);
    }
    Some(element)
}

/// Whether `decl` sits directly in a class body, decorated or not.
fn is_method(decl: Node<'_>) -> bool {
    outer(decl)
        .parent()
        .filter(|p| p.kind() == "block")
        .and_then(|b| b.parent())
        .is_some_and(|c| c.kind() == "class_definition")
}

pub(super) fn callable(
    m: &RawMatch<'_>,
    source: &SourceText<'_>,
    methods: bool,
) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    if is_method(decl) != methods {
        return None;
    }
    let name = source.text_of(m.node("name")?);
    let kind = match (methods, name) {
        (true, "__init__") => ElementKind::Constructor,
        (true, _) => ElementKind::Method,
        (false, _) => ElementKind::Function,
    };

    let is_async = child_of_kind(decl, "async").is_some();
    let mut modifiers = decorators(decl, source);
    if is_async {
        modifiers.push("async".to_string());
    }
    let parameters = decl
        .child_by_field_name("parameters")
        .map(|p| {
            named_children(p)
                .into_iter()
                .filter(|n| n.kind() != "comment")
                .map(|n| compact(source.text_of(n)))
                .collect()
        })
        .unwrap_or_default();
    let return_type = decl
        .child_by_field_name("return_type")
        .map(|t| compact(source.text_of(t)));

    let mut element = CodeElement::new(kind, name, source.span(outer(decl)))
        .with_visibility(visibility_of(name))
        .with_modifiers(modifiers)
        .with_container(container(decl, source))
        .with_detail(ElementDetail::Callable {
            return_type,
            parameters,
            throws: Vec::new(),
            is_async,
        });
    if let Some(tp) = decl.child_by_field_name("type_parameters") {
        element = element.with_attribute("type_parameters", compact(source.text_of(tp)));
    }
    if let Some(doc) = decl.child_by_field_name("body").and_then(|b| docstring(b, source)) {
        element = element.with_attribute("docstring", doc);
    }
    Some(element)
}
