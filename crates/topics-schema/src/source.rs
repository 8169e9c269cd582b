//! # Filesystem Sources
//!
//! Reads raw topic modules from a directory tree. Files ending in `.json`,
//! `.yaml` or `.yml` are modules; everything else is ignored, as are hidden
//! files and directories. A file that cannot be read or parsed becomes a
//! [`FailureReason::Unreadable`] entry in the catalog and the remaining files
//! still load.
//!
//! Origins recorded in the catalog are paths relative to the scanned
//! directory with `/` separators, so reports and lockfiles are stable across
//! machines.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::loader::{Catalog, FailureReason, LoadFailure, Loader, RawModule};

/// Extensions recognized as topic modules.
pub const MODULE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Errors raised while reading module sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source directory not found: {}", .0.display())]
    MissingDir(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// YAML that has no JSON equivalent (e.g. a sequence used as a key).
    #[error("unsupported YAML in {}: {reason}", .path.display())]
    YamlShape { path: PathBuf, reason: String },

    #[error("not a topic module file: {}", .0.display())]
    UnsupportedExtension(PathBuf),
}

/// Recursively list module files under `dir`, sorted by path.
///
/// Unreadable subdirectories are logged and skipped.
///
/// # Errors
///
/// Returns [`SourceError::MissingDir`] if `dir` is not a directory.
pub fn discover_module_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::MissingDir(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    walk(dir, &mut files);
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory");
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            walk(&path, acc);
        } else if is_module_file(&path) {
            acc.push(path);
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// True for `.json`, `.yaml` and `.yml` files (case-insensitive).
pub fn is_module_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MODULE_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
}

/// Read and parse one module file into an untyped value.
pub fn read_raw_module(path: &Path) -> Result<Value, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match ext.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Some("yaml" | "yml") => parse_yaml(&content, path),
        _ => Err(SourceError::UnsupportedExtension(path.to_path_buf())),
    }
}

fn parse_yaml(content: &str, path: &Path) -> Result<Value, SourceError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|source| SourceError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
    yaml_to_json_value(&yaml).map_err(|reason| SourceError::YamlShape {
        path: path.to_path_buf(),
        reason,
    })
}

/// Convert a YAML value tree to the equivalent JSON tree.
///
/// Scalar map keys are stringified; tags are dropped.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("number {f} has no JSON representation"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported map key: {other:?}")),
                };
                out.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

/// Path of `file` relative to `root`, `/`-separated.
pub fn origin_label(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Load every module file under `dir` into one catalog.
///
/// The batch index of a module is its position in the sorted file list.
///
/// # Errors
///
/// Only when `dir` itself is missing. Per-file problems are catalog failures.
pub fn load_dir(dir: &Path, loader: &Loader) -> Result<Catalog, SourceError> {
    let files = discover_module_files(dir)?;
    tracing::debug!(dir = %dir.display(), files = files.len(), "discovered topic files");

    let mut catalog = Catalog::default();
    for (index, path) in files.iter().enumerate() {
        let origin = origin_label(dir, path);
        match read_raw_module(path) {
            Ok(value) => {
                loader.load_into(&mut catalog, index, RawModule::new(value).with_origin(origin));
            }
            Err(e) => {
                tracing::warn!(file = %origin, error = %e, "unreadable topic file");
                catalog.push_failure(LoadFailure {
                    index,
                    id: None,
                    origin: Some(origin),
                    reason: FailureReason::Unreadable {
                        reason: e.to_string(),
                    },
                });
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        loaded = catalog.len(),
        failed = catalog.failures().len(),
        "topic directory loaded"
    );
    Ok(catalog)
}
