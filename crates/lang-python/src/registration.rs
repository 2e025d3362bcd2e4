use crate::PythonPlugin;
use std::sync::Arc;
use structscope_api::{Language, LanguageDescriptor, QueryKind};
use structscope_plugin::{LanguagePlugin, PluginRegistration};

pub const EXTENSIONS: &[&str] = &["py", "pyi"];

pub fn descriptor() -> LanguageDescriptor {
    LanguageDescriptor::new(Language::PYTHON, "Python")
        .with_extensions(EXTENSIONS)
        .with_aliases(&["py", "python3"])
        .with_query_kinds(&[
            QueryKind::CLASSES,
            QueryKind::FUNCTIONS,
            QueryKind::METHODS,
            QueryKind::FIELDS,
            QueryKind::IMPORTS,
            QueryKind::VARIABLES,
        ])
        .with_grammar("tree-sitter-python")
}

pub fn registration() -> PluginRegistration {
    PluginRegistration::new(descriptor(), || {
        Ok(Arc::new(PythonPlugin::new()) as Arc<dyn LanguagePlugin>)
    })
}
