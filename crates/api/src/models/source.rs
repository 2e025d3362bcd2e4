use super::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use xxhash_rust::xxh3::xxh3_64;

/// Content hash plus modification time. Two units with equal fingerprints are
/// interchangeable for caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub content_hash: u64,
    /// Modification time in nanoseconds since the epoch; 0 for in-memory buffers.
    pub mtime_ns: u128,
}

impl Fingerprint {
    pub fn of(content: &[u8], modified: Option<SystemTime>) -> Self {
        let mtime_ns = modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self {
            content_hash: xxh3_64(content),
            mtime_ns,
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}@{}", self.content_hash, self.mtime_ns)
    }
}

/// A file or buffer ready for analysis.
///
/// The text is shared so cache computations can hold it without copying.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    path: Option<PathBuf>,
    language: Language,
    fingerprint: Fingerprint,
    text: Arc<str>,
}

impl SourceUnit {
    /// A unit backed by a file that has already been validated and read.
    pub fn from_file(
        path: PathBuf,
        language: Language,
        text: impl Into<Arc<str>>,
        modified: Option<SystemTime>,
    ) -> Self {
        let text = text.into();
        Self {
            fingerprint: Fingerprint::of(text.as_bytes(), modified),
            path: Some(path),
            language,
            text,
        }
    }

    /// An in-memory buffer with no backing file.
    pub fn from_buffer(language: Language, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        Self {
            fingerprint: Fingerprint::of(text.as_bytes(), None),
            path: None,
            language,
            text,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    /// Cache identity of this unit: equal keys share cached trees and results.
    pub fn key(&self) -> UnitKey {
        UnitKey {
            language: self.language.clone(),
            fingerprint: self.fingerprint,
        }
    }

    /// Human-readable label used in error context and logs.
    pub fn label(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => format!("<buffer {}>", self.fingerprint),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub language: Language,
    pub fingerprint: Fingerprint,
}
