//! # Configuration
//!
//! `topics.yaml` at the repository root (or the file named by `--config`).
//! Every key is optional; a missing file means all defaults. Command-line
//! flags take precedence over file values.
//!
//! ```yaml
//! source_dir: topics
//! lockfile: topics.lock
//! validation:
//!   heading_skips: warn   # or: allow
//!   strict: false
//! normalize:
//!   collapse_whitespace: true
//!   derive_anchors: false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use topics_schema::{HeadingSkipPolicy, LoaderOptions, NormalizeOptions, ValidationPolicy};

/// Default config file name, looked up at the repository root.
pub const CONFIG_FILE: &str = "topics.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Parsed `topics.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopicsConfig {
    /// Directory of topic modules, relative to the repository root.
    pub source_dir: PathBuf,
    /// Lockfile path, relative to the repository root.
    pub lockfile: PathBuf,
    pub validation: ValidationConfig,
    pub normalize: NormalizeOptions,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("topics"),
            lockfile: PathBuf::from("topics.lock"),
            validation: ValidationConfig::default(),
            normalize: NormalizeOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub heading_skips: HeadingSkipPolicy,
    /// Treat warnings as errors.
    pub strict: bool,
}

impl TopicsConfig {
    /// Parse a config file. An empty or comment-only file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    /// Load `explicit` if given (it must exist), else `<repo_root>/topics.yaml`
    /// if present, else defaults.
    pub fn discover(repo_root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let path = crate::resolve_path(path, repo_root);
            if !path.is_file() {
                return Err(ConfigError::NotFound(path));
            }
            tracing::debug!(config = %path.display(), "loading config");
            return Self::load(&path);
        }

        let default_path = repo_root.join(CONFIG_FILE);
        if default_path.is_file() {
            tracing::debug!(config = %default_path.display(), "loading config");
            Self::load(&default_path)
        } else {
            tracing::debug!("no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Loader options, with `strict` forced on when `strict_flag` is set.
    pub fn loader_options(&self, strict_flag: bool) -> LoaderOptions {
        LoaderOptions {
            validation: ValidationPolicy {
                heading_skips: self.validation.heading_skips,
            },
            normalize: self.normalize.clone(),
            strict: strict_flag || self.validation.strict,
        }
    }

    /// Source directory: `dir_flag` if given, else `source_dir` under the
    /// repository root.
    pub fn source_dir(&self, dir_flag: Option<&Path>, repo_root: &Path) -> PathBuf {
        match dir_flag {
            Some(dir) => crate::resolve_path(dir, repo_root),
            None => repo_root.join(&self.source_dir),
        }
    }

    /// Lockfile path: `out_flag` if given, else `lockfile` under the
    /// repository root.
    pub fn lockfile_path(&self, out_flag: Option<&Path>, repo_root: &Path) -> PathBuf {
        match out_flag {
            Some(out) => crate::resolve_path(out, repo_root),
            None => repo_root.join(&self.lockfile),
        }
    }
}
