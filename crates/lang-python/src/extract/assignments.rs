use super::{container, truncate, visibility_of};
use structscope_api::{CodeElement, ElementDetail, ElementKind};
use structscope_plugin::utils::compact;
use structscope_plugin::{RawMatch, SourceText};

fn assignment(
    m: &RawMatch<'_>,
    source: &SourceText<'_>,
    kind: ElementKind,
) -> Option<CodeElement> {
    let statement = m.node("definition")?;
    let assignment = m.node("assignment")?;
    let name = source.text_of(m.node("name")?);
    let type_name = assignment
        .child_by_field_name("type")
        .map(|t| compact(source.text_of(t)));
    let value = assignment
        .child_by_field_name("right")
        .map(|v| truncate(source.text_of(v)));

    Some(
        CodeElement::new(kind, name, source.span(statement))
            .with_visibility(visibility_of(name))
            .with_container(container(statement, source))
            .with_detail(ElementDetail::Variable { type_name, value }),
    )
}

/// Class-level assignment, annotated or not.
pub(super) fn field(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    assignment(m, source, ElementKind::Field)
}

/// Module-level assignment.
pub(super) fn variable(m: &RawMatch<'_>, source: &SourceText<'_>) -> Option<CodeElement> {
    assignment(m, source, ElementKind::Variable)
}
