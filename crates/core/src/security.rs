use crate::error::{AnalysisError, Result};
use std::path::{Component, Path, PathBuf};

/// Confines file access to one project root.
///
/// Paths are resolved (relative paths against the root, `..` and symlinks
/// collapsed) and must land strictly inside the canonical root.
#[derive(Debug, Clone)]
pub struct SecurityBoundary {
    root: PathBuf,
}

impl SecurityBoundary {
    pub fn new(project_root: &Path) -> Result<Self> {
        let root = project_root
            .canonicalize()
            .map_err(|e| AnalysisError::io(project_root.display().to_string(), &e))?;
        if !root.is_dir() {
            return Err(AnalysisError::InvalidArgument(format!(
                "project root '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn validate(&self, raw_path: impl AsRef<Path>) -> Result<PathBuf> {
        let raw_path = raw_path.as_ref();
        let raw = raw_path.to_string_lossy();
        if raw.trim().is_empty() {
            return Err(AnalysisError::InvalidArgument("file path is empty".into()));
        }
        if raw.contains('\0') {
            return Err(self.violation(&raw, "path contains a NUL byte"));
        }

        let joined = if raw_path.is_absolute() {
            raw_path.to_path_buf()
        } else {
            self.root.join(raw_path)
        };

        // Lexical pass first so a missing target under `../` is still caught.
        let normalized = normalize(&joined);
        if !self.is_inside(&normalized) {
            return Err(self.violation(&raw, "path escapes the project root"));
        }

        let resolved = resolve_existing(&normalized);
        if !self.is_inside(&resolved) {
            return Err(self.violation(&raw, "symlink target is outside the project root"));
        }
        Ok(resolved)
    }

    fn is_inside(&self, path: &Path) -> bool {
        path != self.root && path.starts_with(&self.root)
    }

    fn violation(&self, raw: &str, reason: &str) -> AnalysisError {
        tracing::warn!("Rejected path '{}': {}", raw, reason);
        AnalysisError::SecurityViolation {
            path: raw.to_string(),
            root: self.root.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Validates `raw_path` against `project_root` without keeping a boundary.
pub fn validate(raw_path: impl AsRef<Path>, project_root: &Path) -> Result<PathBuf> {
    SecurityBoundary::new(project_root)?.validate(raw_path)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalizes the longest existing prefix of `path` and re-appends the rest.
fn resolve_existing(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    let mut missing = Vec::new();
    let mut current = path.to_path_buf();
    while let Some(name) = current.file_name().map(|n| n.to_os_string()) {
        missing.push(name);
        if !current.pop() {
            break;
        }
        if let Ok(base) = current.canonicalize() {
            let mut out = base;
            for part in missing.iter().rev() {
                out.push(part);
            }
            return out;
        }
    }
    path.to_path_buf()
}
