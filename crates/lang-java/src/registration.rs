use crate::JavaPlugin;
use std::sync::Arc;
use structscope_api::{Language, LanguageDescriptor, QueryKind};
use structscope_plugin::{LanguagePlugin, PluginRegistration};

pub const EXTENSIONS: &[&str] = &["java"];

pub fn descriptor() -> LanguageDescriptor {
    LanguageDescriptor::new(Language::JAVA, "Java")
        .with_extensions(EXTENSIONS)
        .with_query_kinds(&[
            QueryKind::CLASSES,
            QueryKind::METHODS,
            QueryKind::FIELDS,
            QueryKind::IMPORTS,
            QueryKind::PACKAGE,
        ])
        .with_grammar("tree-sitter-java")
}

pub fn registration() -> PluginRegistration {
    PluginRegistration::new(descriptor(), || {
        Ok(Arc::new(JavaPlugin::new()) as Arc<dyn LanguagePlugin>)
    })
}
