//! # topics-cli — CLI Tool for Topic Modules
//!
//! Provides the `topics` command-line interface over the validator,
//! normalizer and loader in `topics-schema`.
//!
//! ## Subcommands
//!
//! - `topics validate` — Validate every module under the source directory.
//! - `topics export` — Write the normalized catalog as JSON.
//! - `topics lock` — Lockfile generation and deterministic verification.
//! - `topics schema` — Print the published JSON Schema.
//!
//! ```bash
//! topics validate --strict --check-links
//! topics export --out build/topics.json
//! topics lock --check
//! ```
//!
//! Every subcommand returns an exit code: 0 on success, 1 on failure.

pub mod config;
pub mod export;
pub mod lock;
pub mod schema;
pub mod validate;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Lockfile format version.
pub const LOCKFILE_VERSION: u32 = 1;

/// Resolve a path that may be relative to the repository root.
///
/// If the path is absolute, returns it as-is. If relative and the file
/// exists relative to `repo_root`, uses that. Otherwise returns the path
/// relative to the current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Write `bytes` to `out`, or to stdout when `out` is `None`.
pub fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("failed to write to stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}
