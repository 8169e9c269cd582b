//! # Export Subcommand
//!
//! Writes the normalized catalog as pretty-printed JSON:
//!
//! ```json
//! { "topics": { "<id>": { ...module... } }, "failures": [ ... ] }
//! ```
//!
//! Topics are keyed and ordered by id. Modules that failed to load are listed
//! under `failures` with their reason, and the command exits 1 so a pipeline
//! notices, but the file is still written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use topics_core::{TopicId, TopicModule};
use topics_schema::{load_dir, Catalog, LoadFailure, Loader};

use crate::config::TopicsConfig;

/// Arguments for the `topics export` subcommand.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Directory of topic modules (defaults to `source_dir` from topics.yaml).
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output file. Prints to stdout when omitted.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Serialized export document.
#[derive(Debug, Serialize)]
pub struct CatalogExport<'a> {
    pub topics: BTreeMap<&'a TopicId, &'a TopicModule>,
    pub failures: &'a [LoadFailure],
}

impl<'a> CatalogExport<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            topics: catalog
                .modules()
                .iter()
                .map(|(id, loaded)| (id, &loaded.module))
                .collect(),
            failures: catalog.failures(),
        }
    }
}

/// Execute the export subcommand.
///
/// Returns exit code: 0 when every module loaded, 1 otherwise.
pub fn run_export(args: &ExportArgs, repo_root: &Path, config: &TopicsConfig) -> Result<u8> {
    let dir = config.source_dir(args.dir.as_deref(), repo_root);
    let loader = Loader::new(config.loader_options(false));
    let catalog = load_dir(&dir, &loader)
        .with_context(|| format!("failed to load topics from {}", dir.display()))?;

    let mut json = serde_json::to_vec_pretty(&CatalogExport::new(&catalog))
        .context("failed to serialize catalog")?;
    json.push(b'\n');

    let out = args.out.as_deref().map(|p| crate::resolve_path(p, repo_root));
    crate::write_output(out.as_deref(), &json)?;

    if let Some(path) = &out {
        eprintln!(
            "OK: exported {} topic(s) to {}",
            catalog.len(),
            path.display()
        );
    }
    for failure in catalog.failures() {
        eprintln!("FAIL: {}: {}", failure.label(), failure.reason);
    }

    Ok(u8::from(!catalog.is_complete()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let topics = dir.path().join("topics");
        std::fs::create_dir_all(&topics).unwrap();
        std::fs::write(
            topics.join("lists.yaml"),
            "meta:\n  title: Lists\n  description: d\n  category: c\n  difficulty: beginner\n\
             content:\n  - type: list\n    style: number\n    items: ['  one  ', two]\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn export_writes_normalized_catalog() {
        let dir = setup();
        let args = ExportArgs {
            dir: None,
            out: Some(dir.path().join("build").join("topics.json")),
        };
        let code = run_export(&args, dir.path(), &TopicsConfig::default()).unwrap();
        assert_eq!(code, 0);

        let written = std::fs::read_to_string(dir.path().join("build/topics.json")).unwrap();
        let doc: Value = serde_json::from_str(&written).unwrap();
        let lists = &doc["topics"]["lists"];
        assert_eq!(lists["meta"]["id"], "lists");
        assert_eq!(
            lists["content"][0],
            json!({"type": "list", "style": "ordered", "items": ["one", "two"]})
        );
        assert_eq!(doc["failures"], json!([]));
    }

    #[test]
    fn export_includes_failures_and_exits_1() {
        let dir = setup();
        std::fs::write(dir.path().join("topics/bad.json"), "{}").unwrap();
        let args = ExportArgs {
            dir: None,
            out: Some(dir.path().join("out.json")),
        };
        let code = run_export(&args, dir.path(), &TopicsConfig::default()).unwrap();
        assert_eq!(code, 1);

        let doc: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap())
                .unwrap();
        assert_eq!(doc["failures"][0]["origin"], "bad.json");
        assert_eq!(doc["failures"][0]["reason"]["kind"], "invalid");
        assert_eq!(
            doc["failures"][0]["reason"]["errors"][0]["kind"],
            "MissingField"
        );
    }
}
