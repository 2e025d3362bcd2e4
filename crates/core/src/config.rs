use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-project configuration file, looked up directly under the project root.
pub const CONFIG_FILE_NAME: &str = ".structscope.json";

pub const ENV_PARSE_CACHE_CAPACITY: &str = "STRUCTSCOPE_PARSE_CACHE_CAPACITY";
pub const ENV_RESULT_CACHE_CAPACITY: &str = "STRUCTSCOPE_RESULT_CACHE_CAPACITY";
pub const ENV_RESULT_TTL_SECS: &str = "STRUCTSCOPE_RESULT_TTL_SECS";
pub const ENV_PARSE_TIMEOUT_MS: &str = "STRUCTSCOPE_PARSE_TIMEOUT_MS";
pub const ENV_QUERY_TIMEOUT_MS: &str = "STRUCTSCOPE_QUERY_TIMEOUT_MS";
pub const ENV_MAX_FILE_BYTES: &str = "STRUCTSCOPE_MAX_FILE_BYTES";
pub const ENV_LARGE_FILE_LINES: &str = "STRUCTSCOPE_LARGE_FILE_LINES";

/// Files that mark a directory as a project root.
pub const ROOT_MARKERS: &[&str] = &[
    CONFIG_FILE_NAME,
    ".git",
    "Cargo.toml",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "pyproject.toml",
    "setup.py",
    "package.json",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub parse_cache_capacity: u64,
    pub result_cache_capacity: u64,
    pub result_ttl_secs: u64,
    pub parse_timeout_ms: u64,
    pub query_timeout_ms: u64,
    /// Files above this size are rejected before they are read.
    pub max_file_bytes: u64,
    /// Line count above which `check_scale` flags a file as large.
    pub large_file_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parse_cache_capacity: 100,
            result_cache_capacity: 1000,
            result_ttl_secs: 3600,
            parse_timeout_ms: 30_000,
            query_timeout_ms: 30_000,
            max_file_bytes: 10 * 1024 * 1024,
            large_file_lines: 1000,
        }
    }
}

impl EngineConfig {
    /// Defaults, then `<root>/.structscope.json` if present, then environment.
    pub fn load(project_root: &Path) -> Result<Self> {
        let file = project_root.join(CONFIG_FILE_NAME);
        let mut config = if file.is_file() {
            Self::from_file(&file)?
        } else {
            Self::default()
        };
        config.apply_env_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let label = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(&label, &e))?;
        serde_json::from_str(&content)
            .map_err(|e| AnalysisError::InvalidArgument(format!("invalid config {label}: {e}")))
    }

    /// Overrides fields from variables found through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
            raw.trim().parse().map_err(|_| {
                AnalysisError::InvalidArgument(format!("{key} must be a non-negative integer, got '{raw}'"))
            })
        }

        if let Some(v) = lookup(ENV_PARSE_CACHE_CAPACITY) {
            self.parse_cache_capacity = parse(ENV_PARSE_CACHE_CAPACITY, &v)?;
        }
        if let Some(v) = lookup(ENV_RESULT_CACHE_CAPACITY) {
            self.result_cache_capacity = parse(ENV_RESULT_CACHE_CAPACITY, &v)?;
        }
        if let Some(v) = lookup(ENV_RESULT_TTL_SECS) {
            self.result_ttl_secs = parse(ENV_RESULT_TTL_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_PARSE_TIMEOUT_MS) {
            self.parse_timeout_ms = parse(ENV_PARSE_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_QUERY_TIMEOUT_MS) {
            self.query_timeout_ms = parse(ENV_QUERY_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_FILE_BYTES) {
            self.max_file_bytes = parse(ENV_MAX_FILE_BYTES, &v)?;
        }
        if let Some(v) = lookup(ENV_LARGE_FILE_LINES) {
            self.large_file_lines = parse(ENV_LARGE_FILE_LINES, &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.parse_timeout_ms == 0 || self.query_timeout_ms == 0 {
            return Err(AnalysisError::InvalidArgument(
                "timeouts must be greater than zero".into(),
            ));
        }
        if self.result_ttl_secs == 0 {
            return Err(AnalysisError::InvalidArgument(
                "result_ttl_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn parse_timeout(&self) -> Duration {
        Duration::from_millis(self.parse_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}

/// Walks up from `start` to the nearest directory holding a root marker.
/// Falls back to the canonical `start` directory itself.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    let dir = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or_else(|| start.clone())
    } else {
        start.clone()
    };

    for candidate in dir.ancestors() {
        if ROOT_MARKERS.iter().any(|m| candidate.join(m).exists()) {
            return candidate.to_path_buf();
        }
    }
    dir
}
