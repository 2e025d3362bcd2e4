use structscope_api::QueryKind;
use structscope_plugin::{QueryDefinition, QueryDefinitions};

pub const CLASSES_SCM: &str = include_str!("classes.scm");
pub const FUNCTIONS_SCM: &str = include_str!("functions.scm");
pub const FIELDS_SCM: &str = include_str!("fields.scm");
pub const VARIABLES_SCM: &str = include_str!("variables.scm");
pub const IMPORTS_SCM: &str = include_str!("imports.scm");

// Post-process tags. `functions` and `methods` share one pattern and are
// told apart by where the def sits.
pub const TYPES: &str = "types";
pub const FUNCTIONS: &str = "functions";
pub const METHODS: &str = "methods";
pub const FIELDS: &str = "fields";
pub const VARIABLES: &str = "variables";
pub const IMPORTS: &str = "imports";

fn callable(tag: &'static str) -> QueryDefinition {
    QueryDefinition::new(FUNCTIONS_SCM)
        .capture("function.name", "name")
        .capture("function.definition", "definition")
        .postprocess(tag)
}

fn assignment(pattern: &'static str, prefix: &str, tag: &'static str) -> QueryDefinition {
    QueryDefinition::new(pattern)
        .capture(&format!("{prefix}.name"), "name")
        .capture(&format!("{prefix}.assignment"), "assignment")
        .capture(&format!("{prefix}.definition"), "definition")
        .postprocess(tag)
}

pub fn definitions() -> QueryDefinitions {
    let mut defs = QueryDefinitions::new();
    defs.insert(
        QueryKind::CLASSES,
        QueryDefinition::new(CLASSES_SCM)
            .capture("type.name", "name")
            .capture("type.definition", "definition")
            .postprocess(TYPES),
    );
    defs.insert(QueryKind::FUNCTIONS, callable(FUNCTIONS));
    defs.insert(QueryKind::METHODS, callable(METHODS));
    defs.insert(QueryKind::FIELDS, assignment(FIELDS_SCM, "field", FIELDS));
    defs.insert(
        QueryKind::IMPORTS,
        QueryDefinition::new(IMPORTS_SCM)
            .capture("import.definition", "definition")
            .postprocess(IMPORTS),
    );
    defs.insert(
        QueryKind::VARIABLES,
        assignment(VARIABLES_SCM, "variable", VARIABLES),
    );
    defs
}
