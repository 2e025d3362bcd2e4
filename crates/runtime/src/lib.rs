use std::path::PathBuf;
use std::sync::Arc;
use structscope_api::AnalysisResult;
use structscope_core::{AnalysisEngine, LanguageRegistry, detect_project_root};

/// A registry holding every bundled language plugin.
///
/// Registration only stores descriptors and factories; plugins are built on
/// first use.
pub fn default_registry() -> Arc<LanguageRegistry> {
    let registry = LanguageRegistry::new()
        .with(structscope_java::registration())
        .with(structscope_python::registration());
    tracing::debug!(
        "Registered languages: {:?}",
        registry
            .list_languages()
            .iter()
            .map(|d| d.language.to_string())
            .collect::<Vec<_>>()
    );
    Arc::new(registry)
}

/// Opens (or reuses) the engine for `root` with the bundled plugins and the
/// configuration found under the root.
///
/// Without an explicit root, the project root is detected by walking up from
/// the current directory.
pub fn open_engine(root: Option<PathBuf>) -> AnalysisResult<Arc<AnalysisEngine>> {
    let root = match root {
        Some(root) => root,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| structscope_api::AnalysisError::io(".", &e))?;
            detect_project_root(&cwd)
        }
    };
    AnalysisEngine::builder(root)
        .with_registry(default_registry())
        .open()
}

/// Initializes logging for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> impl Drop {
    structscope_core::logging::init_logging(component, to_stderr)
}
