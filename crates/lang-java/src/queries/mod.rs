use structscope_api::QueryKind;
use structscope_plugin::{QueryDefinition, QueryDefinitions};

pub const CLASSES_SCM: &str = include_str!("classes.scm");
pub const METHODS_SCM: &str = include_str!("methods.scm");
pub const FIELDS_SCM: &str = include_str!("fields.scm");
pub const IMPORTS_SCM: &str = include_str!("imports.scm");
pub const PACKAGE_SCM: &str = include_str!("package.scm");

// Post-process tags, dispatched on in `extract`.
pub const TYPES: &str = "types";
pub const CALLABLES: &str = "callables";
pub const FIELDS: &str = "fields";
pub const IMPORTS: &str = "imports";
pub const PACKAGE: &str = "package";

pub fn definitions() -> QueryDefinitions {
    let mut defs = QueryDefinitions::new();
    defs.insert(
        QueryKind::CLASSES,
        QueryDefinition::new(CLASSES_SCM)
            .capture("type.name", "name")
            .capture("type.definition", "definition")
            .postprocess(TYPES),
    );
    defs.insert(
        QueryKind::METHODS,
        QueryDefinition::new(METHODS_SCM)
            .capture("method.name", "name")
            .capture("method.definition", "definition")
            .postprocess(CALLABLES),
    );
    defs.insert(
        QueryKind::FIELDS,
        QueryDefinition::new(FIELDS_SCM)
            .capture("field.name", "name")
            .capture("field.declarator", "declarator")
            .capture("field.definition", "definition")
            .postprocess(FIELDS),
    );
    defs.insert(
        QueryKind::IMPORTS,
        QueryDefinition::new(IMPORTS_SCM)
            .capture("import.definition", "definition")
            .postprocess(IMPORTS),
    );
    defs.insert(
        QueryKind::PACKAGE,
        QueryDefinition::new(PACKAGE_SCM)
            .capture("package.definition", "definition")
            .postprocess(PACKAGE),
    );
    defs
}
