use super::{container, default_visibility, modifiers, truncate};
use structscope_api::{CodeElement, ElementDetail, ElementKind, Visibility};
use structscope_plugin::utils::{child_of_kind, compact, named_children};
use structscope_plugin::{RawMatch, SourceText};

pub(super) fn callable(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    let name = m.node("name")?;
    let kind = match decl.kind() {
        "method_declaration" | "annotation_type_element_declaration" => ElementKind::Method,
        "constructor_declaration" | "compact_constructor_declaration" => ElementKind::Constructor,
        _ => return None,
    };

    let (mods, visibility) = modifiers(decl, source);
    let visibility = visibility.unwrap_or_else(|| {
        let in_enum = decl.parent().is_some_and(|p| p.kind() == "enum_body_declarations");
        if kind == ElementKind::Constructor && in_enum {
            Visibility::Private
        } else {
            default_visibility(decl)
        }
    });

    let return_type = match kind {
        ElementKind::Method => decl.child_by_field_name("type").map(|t| {
            let mut ty = compact(source.text_of(t));
            if let Some(dims) = decl.child_by_field_name("dimensions") {
                ty.push_str(source.text_of(dims));
            }
            ty
        }),
        _ => None,
    };
    let parameters = decl
        .child_by_field_name("parameters")
        .map(|p| {
            named_children(p)
                .into_iter()
                .filter(|n| !n.kind().ends_with("comment"))
                .map(|n| compact(source.text_of(n)))
                .collect()
        })
        .unwrap_or_default();
    let throws = child_of_kind(decl, "throws")
        .map(|t| {
            named_children(t)
                .into_iter()
                .map(|n| compact(source.text_of(n)))
                .collect()
        })
        .unwrap_or_default();

    let mut element = CodeElement::new(kind, source.text_of(name), source.span(decl))
        .with_visibility(visibility)
        .with_modifiers(mods)
        .with_container(container(decl, source))
        .with_detail(ElementDetail::Callable {
            return_type,
            parameters,
            throws,
            is_async: false,
        });
    if let Some(tp) = decl.child_by_field_name("type_parameters") {
        element = element.with_attribute("type_parameters", compact(source.text_of(tp)));
    }
    if decl.kind() == "annotation_type_element_declaration" {
        if let Some(default) = decl.child_by_field_name("value") {
            element = element.with_attribute("default", truncate(source.text_of(default)));
        }
    }
    Some(element)
}

/// One element per declarator; enum constants come through the same query.
pub(super) fn field(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    let decl = m.node("definition")?;
    let name = m.node("name")?;
    let (mods, visibility) = modifiers(decl, source);
    let container = container(decl, source);

    if decl.kind() == "enum_constant" {
        let value = decl
            .child_by_field_name("arguments")
            .map(|a| truncate(source.text_of(a)));
        let type_name = container
            .as_deref()
            .map(|c| c.rsplit('.').next().unwrap_or(c).to_string());
        return Some(
            CodeElement::new(ElementKind::EnumConstant, source.text_of(name), source.span(decl))
                .with_visibility(Visibility::Public)
                .with_modifiers(mods)
                .with_container(container)
                .with_detail(ElementDetail::Variable { type_name, value }),
        );
    }

    let declarator = m.node("declarator")?;
    let mut type_name = decl.child_by_field_name("type").map(|t| compact(source.text_of(t)));
    if let (Some(ty), Some(dims)) = (type_name.as_mut(), declarator.child_by_field_name("dimensions")) {
        ty.push_str(source.text_of(dims));
    }
    let value = declarator
        .child_by_field_name("value")
        .map(|v| truncate(source.text_of(v)));

    Some(
        CodeElement::new(ElementKind::Field, source.text_of(name), source.span(decl))
            .with_visibility(visibility.unwrap_or_else(|| default_visibility(decl)))
            .with_modifiers(mods)
            .with_container(container)
            .with_detail(ElementDetail::Variable { type_name, value }),
    )
}
