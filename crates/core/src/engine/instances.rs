//! Process-wide registry of engines, one per canonical project root.

use super::{AnalysisEngine, EngineState};
use crate::error::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

static INSTANCES: Lazy<Mutex<HashMap<PathBuf, Arc<AnalysisEngine>>>> = Lazy::new(Default::default);

/// Returns the live engine for `root`, or builds one with `create`.
///
/// The lock is held across `create`, so racing first requests for the same
/// root observe a single instance.
pub(crate) fn get_or_create<F>(root: &Path, create: F) -> Result<Arc<AnalysisEngine>>
where
    F: FnOnce() -> Result<AnalysisEngine>,
{
    let mut instances = INSTANCES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = instances.get(root) {
        if existing.state() == EngineState::Ready {
            return Ok(Arc::clone(existing));
        }
    }

    let engine = Arc::new(create()?);
    instances.insert(root.to_path_buf(), Arc::clone(&engine));
    tracing::info!("Opened analysis engine for {}", root.display());
    Ok(engine)
}

/// Drops `engine` from the registry if it is still the one registered.
pub(crate) fn remove(root: &Path, engine: &AnalysisEngine) {
    let mut instances = INSTANCES.lock().unwrap_or_else(PoisonError::into_inner);
    if instances
        .get(root)
        .is_some_and(|current| std::ptr::eq(current.as_ref(), engine))
    {
        instances.remove(root);
    }
}

/// The registered engine for an already-canonical `root`.
pub fn lookup(root: &Path) -> Option<Arc<AnalysisEngine>> {
    INSTANCES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(root)
        .cloned()
}
