use crate::error::PluginResult;
use crate::plugin::LanguagePlugin;
use std::sync::Arc;
use structscope_api::LanguageDescriptor;

/// Deferred plugin construction. Called at most once per successful load.
pub type PluginFactory = Arc<dyn Fn() -> PluginResult<Arc<dyn LanguagePlugin>> + Send + Sync>;

/// What a plugin crate hands to the registry: static description plus a way
/// to build the plugin later.
#[derive(Clone)]
pub struct PluginRegistration {
    pub descriptor: LanguageDescriptor,
    pub factory: PluginFactory,
}

impl PluginRegistration {
    pub fn new<F>(descriptor: LanguageDescriptor, factory: F) -> Self
    where
        F: Fn() -> PluginResult<Arc<dyn LanguagePlugin>> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            factory: Arc::new(factory),
        }
    }
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
