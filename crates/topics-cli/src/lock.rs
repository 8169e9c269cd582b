//! # Lock Subcommand
//!
//! Lockfile generation and deterministic byte-level verification.
//!
//! The lockfile records the content digest of every normalized topic, so a
//! change to any module (other than a pure reformatting that normalizes
//! away) shows up as a lockfile diff. It is serialized as JCS-canonical JSON
//! via `CanonicalBytes`:
//!
//! ```json
//! {"generated_at":"2024-06-01T00:00:00Z","topics":[{"digest":"sha256:…","id":"java-strings","origin":"java/java-strings.json"}],"version":1}
//! ```
//!
//! A lockfile is only written when every module loads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use topics_core::temporal::{now_timestamp, timestamp_from_epoch, TIMESTAMP_FORMAT};
use topics_core::{CanonicalBytes, TopicId};
use topics_schema::{load_dir, Catalog, Loader};

use crate::config::TopicsConfig;

/// Arguments for the `topics lock` subcommand.
#[derive(Args, Debug, Default)]
pub struct LockArgs {
    /// Directory of topic modules (defaults to `source_dir` from topics.yaml).
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Verify existing lockfile matches instead of generating.
    #[arg(long)]
    pub check: bool,

    /// Output path for the lockfile (defaults to `lockfile` from topics.yaml).
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Override the generated_at timestamp (`YYYY-MM-DDTHH:MM:SSZ`).
    #[arg(long)]
    pub generated_at: Option<String>,
}

/// On-disk lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub version: u32,
    pub generated_at: String,
    /// Sorted by id.
    pub topics: Vec<LockEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub id: TopicId,
    /// `sha256:<hex>`.
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Lockfile {
    /// Build a lockfile from a fully loaded catalog.
    pub fn from_catalog(catalog: &Catalog, generated_at: String) -> Result<Self> {
        let topics = catalog
            .modules()
            .iter()
            .map(|(id, loaded)| {
                let digest = loaded
                    .digest()
                    .with_context(|| format!("failed to digest topic {id}"))?;
                Ok(LockEntry {
                    id: id.clone(),
                    digest: digest.to_string(),
                    origin: loaded.origin.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            version: crate::LOCKFILE_VERSION,
            generated_at,
            topics,
        })
    }

    /// Canonical bytes plus trailing newline, as written to disk.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let canonical = CanonicalBytes::new(self).context("failed to canonicalize lockfile")?;
        let mut bytes = canonical.into_bytes();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Execute the lock subcommand.
///
/// Returns exit code: 0 on success, 1 if modules fail to load or `--check`
/// finds a difference.
pub fn run_lock(args: &LockArgs, repo_root: &Path, config: &TopicsConfig) -> Result<u8> {
    let dir = config.source_dir(args.dir.as_deref(), repo_root);
    let out_path = config.lockfile_path(args.out.as_deref(), repo_root);

    let loader = Loader::new(config.loader_options(false));
    let catalog = load_dir(&dir, &loader)
        .with_context(|| format!("failed to load topics from {}", dir.display()))?;

    if !catalog.is_complete() {
        for failure in catalog.failures() {
            println!("FAIL: {}: {}", failure.label(), failure.reason);
        }
        println!(
            "FAIL: {} topic(s) failed to load; lockfile not updated",
            catalog.failures().len()
        );
        return Ok(1);
    }

    if args.check && !out_path.exists() {
        println!("FAIL: lockfile does not exist: {}", out_path.display());
        return Ok(1);
    }

    let generated_at = resolve_generated_at(args, &out_path)?;
    let lock = Lockfile::from_catalog(&catalog, generated_at)?;
    let bytes = lock.to_bytes()?;

    if args.check {
        let existing = std::fs::read(&out_path)
            .with_context(|| format!("failed to read lockfile: {}", out_path.display()))?;

        // Allow a missing trailing newline.
        let matches = existing == bytes || existing.as_slice() == &bytes[..bytes.len() - 1];
        if matches {
            println!("OK: lockfile is up to date");
            return Ok(0);
        }

        println!("FAIL: lockfile is outdated or differs from computed lockfile");
        match serde_json::from_slice::<Lockfile>(&existing) {
            Ok(previous) => {
                for line in diff_lockfiles(&previous, &lock) {
                    println!("  {line}");
                }
            }
            Err(e) => println!("  existing lockfile is unreadable: {e}"),
        }
        Ok(1)
    } else {
        crate::write_output(Some(&out_path), &bytes)?;
        println!(
            "OK: wrote lockfile for {} topic(s) to {}",
            lock.topics.len(),
            out_path.display()
        );
        Ok(0)
    }
}

/// Resolve the generated_at timestamp.
///
/// Priority:
/// 1. Explicit --generated-at flag
/// 2. Existing lockfile's generated_at (for --check stability)
/// 3. SOURCE_DATE_EPOCH environment variable
/// 4. Current UTC time
fn resolve_generated_at(args: &LockArgs, out_path: &Path) -> Result<String> {
    if let Some(ref ts) = args.generated_at {
        if chrono::NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).is_err() {
            bail!("--generated-at must look like 2024-01-31T12:00:00Z, got {ts:?}");
        }
        return Ok(ts.clone());
    }

    // Reuse the existing lockfile's timestamp for stability.
    if let Some(ts) = existing_generated_at(out_path) {
        return Ok(ts);
    }

    if let Ok(epoch_str) = std::env::var("SOURCE_DATE_EPOCH") {
        if let Some(ts) = epoch_str.trim().parse::<i64>().ok().and_then(timestamp_from_epoch) {
            return Ok(ts);
        }
        tracing::warn!(value = %epoch_str, "ignoring unparseable SOURCE_DATE_EPOCH");
    }

    if args.check {
        bail!(
            "--check requires a deterministic generated_at \
             (use --generated-at or SOURCE_DATE_EPOCH)"
        );
    }

    Ok(now_timestamp())
}

fn existing_generated_at(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let existing: serde_json::Value = serde_json::from_str(&content).ok()?;
    existing
        .get("generated_at")
        .and_then(|v| v.as_str())
        .filter(|ts| !ts.is_empty())
        .map(str::to_string)
}

/// Human-readable differences between two lockfiles, by topic id.
pub fn diff_lockfiles(previous: &Lockfile, current: &Lockfile) -> Vec<String> {
    let before: BTreeMap<&TopicId, &LockEntry> =
        previous.topics.iter().map(|e| (&e.id, e)).collect();
    let after: BTreeMap<&TopicId, &LockEntry> =
        current.topics.iter().map(|e| (&e.id, e)).collect();

    let mut lines = Vec::new();
    if previous.version != current.version {
        lines.push(format!(
            "version: {} -> {}",
            previous.version, current.version
        ));
    }
    for (id, entry) in &after {
        match before.get(id) {
            None => lines.push(format!("added: {id}")),
            Some(old) if old.digest != entry.digest => lines.push(format!("changed: {id}")),
            Some(old) if old.origin != entry.origin => lines.push(format!("moved: {id}")),
            Some(_) => {}
        }
    }
    for id in before.keys() {
        if !after.contains_key(id) {
            lines.push(format!("removed: {id}"));
        }
    }
    lines
}
