use super::{container, default_visibility, modifiers};
use structscope_api::{CodeElement, ElementDetail, ElementKind};
use structscope_plugin::utils::{child_of_kind, compact, named_children};
use structscope_plugin::{RawMatch, SourceText};
use tree_sitter::Node;

pub(super) fn type_declaration(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    let name = m.node("name")?;
    let kind = match decl.kind() {
        "class_declaration" => ElementKind::Class,
        "interface_declaration" => ElementKind::Interface,
        "enum_declaration" => ElementKind::Enum,
        "record_declaration" => ElementKind::Record,
        "annotation_type_declaration" => ElementKind::Annotation,
        _ => return None,
    };

    let (mods, visibility) = modifiers(decl, source);
    let superclass = decl
        .child_by_field_name("superclass")
        .and_then(|s| s.named_child(0))
        .map(|t| compact(source.text_of(t)));
    let interfaces = match kind {
        ElementKind::Interface => type_list(child_of_kind(decl, "extends_interfaces"), source),
        _ => type_list(decl.child_by_field_name("interfaces"), source),
    };
    let type_parameters = decl
        .child_by_field_name("type_parameters")
        .map(|t| compact(source.text_of(t)));

    let mut element = CodeElement::new(kind, source.text_of(name), source.span(decl))
        .with_visibility(visibility.unwrap_or_else(|| default_visibility(decl)))
        .with_modifiers(mods)
        .with_container(container(decl, source))
        .with_detail(ElementDetail::Type {
            superclass,
            interfaces,
            type_parameters,
        });

    if kind == ElementKind::Record {
        if let Some(params) = decl.child_by_field_name("parameters") {
            element = element.with_attribute("components", compact(source.text_of(params)));
        }
    }
    Some(element)
}

/// Types listed under `implements` / `extends` of an interface.
fn type_list(clause: Option<Node<'_>>, source: &SourceText<'_>) -> Vec<String> {
    clause
        .and_then(|c| child_of_kind(c, "type_list"))
        .map(|list| {
            named_children(list)
                .into_iter()
                .map(|t| compact(source.text_of(t)))
                .collect()
        })
        .unwrap_or_default()
}
