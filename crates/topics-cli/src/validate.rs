//! # Validate Subcommand
//!
//! Loads every topic module under the source directory and reports, per
//! module, everything the validator found.
//!
//! ```text
//! Topics: 3/4 passed
//!   FAIL: java/broken.json
//!     meta.title: required field is missing (MissingField)
//!   WARN: sql/joins.json: content[2].rows[1]: row has 1 cells, header has 2 (RaggedTableWarning)
//!
//! 1 topic(s) failed validation out of 4 total.
//! ```
//!
//! `--cross-check` additionally runs each loaded module through the published
//! JSON Schema; any disagreement fails the run. `--check-links` fails the run
//! when a `nextSteps` or `prerequisites` entry names a topic that is not loaded.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use topics_schema::source::read_raw_module;
use topics_schema::{load_dir, Catalog, FailureReason, LinkKind, Loader, TopicSchema};

use crate::config::TopicsConfig;

/// Arguments for the `topics validate` subcommand.
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Directory of topic modules (defaults to `source_dir` from topics.yaml).
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Also check each module against the published JSON Schema.
    #[arg(long)]
    pub cross_check: bool,

    /// Fail on references to topics that are not loaded.
    #[arg(long)]
    pub check_links: bool,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure.
pub fn run_validate(args: &ValidateArgs, repo_root: &Path, config: &TopicsConfig) -> Result<u8> {
    let dir = config.source_dir(args.dir.as_deref(), repo_root);
    let loader = Loader::new(config.loader_options(args.strict));
    let catalog = load_dir(&dir, &loader)
        .with_context(|| format!("failed to load topics from {}", dir.display()))?;

    let mut stdout = std::io::stdout().lock();
    let failed = write_report(&catalog, args, &dir, &mut stdout)?;
    Ok(u8::from(failed))
}

/// Print the validation report for `catalog`. Returns `true` if the run failed.
pub fn write_report(
    catalog: &Catalog,
    args: &ValidateArgs,
    dir: &Path,
    out: &mut dyn Write,
) -> Result<bool> {
    if catalog.total() == 0 {
        writeln!(out, "WARN: no topic modules found in {}", dir.display())?;
        return Ok(false);
    }

    writeln!(out, "Topics: {}/{} passed", catalog.len(), catalog.total())?;

    for failure in catalog.failures() {
        writeln!(out, "  FAIL: {}", failure.label())?;
        for line in failure_details(&failure.reason) {
            writeln!(out, "    {line}")?;
        }
    }

    for loaded in catalog.modules().values() {
        for warning in &loaded.warnings {
            writeln!(out, "  WARN: {}: {warning}", loaded.label())?;
        }
    }

    let mut failed = !catalog.is_complete();

    if args.cross_check {
        failed |= cross_check_catalog(catalog, dir, out)?;
    }

    let dangling = catalog.dangling_links();
    if args.check_links {
        for link in &dangling {
            let kind = match link.kind {
                LinkKind::NextStep => "next step",
                LinkKind::Prerequisite => "prerequisite",
            };
            writeln!(out, "  LINK: {} -> {} ({kind})", link.from, link.target)?;
        }
        failed |= !dangling.is_empty();
    } else if !dangling.is_empty() {
        tracing::info!(count = dangling.len(), "topics reference ids that are not loaded");
    }

    if !catalog.is_complete() {
        writeln!(
            out,
            "\n{} topic(s) failed validation out of {} total.",
            catalog.failures().len(),
            catalog.total()
        )?;
    }

    Ok(failed)
}

/// One line per finding behind a failure.
fn failure_details(reason: &FailureReason) -> Vec<String> {
    match reason {
        FailureReason::Invalid { errors } => {
            errors.diagnostics().iter().map(ToString::to_string).collect()
        }
        FailureReason::WarningsAsErrors { warnings } => warnings
            .iter()
            .map(|w| format!("{w} [strict]"))
            .collect(),
        other => vec![other.to_string()],
    }
}

/// Re-read every loaded module and check it against the published schema.
fn cross_check_catalog(catalog: &Catalog, dir: &Path, out: &mut dyn Write) -> Result<bool> {
    let schema = TopicSchema::new().context("failed to build topic schema")?;
    let mut disagreements = 0usize;

    for loaded in catalog.modules().values() {
        let Some(origin) = &loaded.origin else {
            continue;
        };
        let raw = read_raw_module(&dir.join(origin))
            .with_context(|| format!("failed to re-read {origin}"))?;
        for violation in schema.check(&raw) {
            writeln!(out, "  SCHEMA: {origin}: {violation}")?;
            disagreements += 1;
        }
    }

    if disagreements > 0 {
        tracing::warn!(
            disagreements,
            "published schema rejects modules the validator accepted"
        );
    }
    Ok(disagreements > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module(id: &str) -> serde_json::Value {
        json!({
            "meta": {"id": id, "title": id, "description": "d", "category": "c", "difficulty": "beginner"},
            "content": [{"type": "paragraph", "text": "p"}]
        })
    }

    fn write_module(dir: &Path, name: &str, value: &serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    fn report(dir: &Path, args: &ValidateArgs) -> (bool, String) {
        let catalog = load_dir(dir, &Loader::default()).unwrap();
        let mut buf = Vec::new();
        let failed = write_report(&catalog, args, dir, &mut buf).unwrap();
        (failed, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn clean_directory_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a.json", &module("a"));
        write_module(dir.path(), "b.json", &module("b"));

        let (failed, out) = report(dir.path(), &ValidateArgs::default());
        assert!(!failed);
        assert!(out.starts_with("Topics: 2/2 passed"), "{out}");
    }

    #[test]
    fn failure_lists_every_error() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a.json", &module("a"));
        write_module(dir.path(), "bad.json", &json!({"meta": {"title": "Bad"}, "content": []}));

        let (failed, out) = report(dir.path(), &ValidateArgs::default());
        assert!(failed);
        assert!(out.contains("Topics: 1/2 passed"));
        assert!(out.contains("  FAIL: bad.json"));
        assert!(out.contains("    meta.description: required field is missing (MissingField)"));
        assert!(out.contains("    meta.difficulty: required field is missing (MissingField)"));
        assert!(out.contains("1 topic(s) failed validation out of 2 total."));
    }

    #[test]
    fn warnings_are_printed_but_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = module("tables");
        m["content"] = json!([{"type": "table", "headers": ["a", "b"], "rows": [["x"]]}]);
        write_module(dir.path(), "tables.json", &m);

        let (failed, out) = report(dir.path(), &ValidateArgs::default());
        assert!(!failed);
        assert!(out.contains("  WARN: tables.json: content[0].rows[0]"), "{out}");
    }

    #[test]
    fn dangling_links_fail_only_when_checked() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = module("a");
        m["nextSteps"] = json!([{"topicId": "ghost", "reason": "r"}]);
        write_module(dir.path(), "a.json", &m);

        let (failed, _) = report(dir.path(), &ValidateArgs::default());
        assert!(!failed);

        let args = ValidateArgs {
            check_links: true,
            ..ValidateArgs::default()
        };
        let (failed, out) = report(dir.path(), &args);
        assert!(failed);
        assert!(out.contains("  LINK: a -> ghost (next step)"));
    }

    #[test]
    fn cross_check_passes_on_clean_modules() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a.json", &module("a"));
        let args = ValidateArgs {
            cross_check: true,
            ..ValidateArgs::default()
        };
        let (failed, out) = report(dir.path(), &args);
        assert!(!failed, "{out}");
        assert!(!out.contains("SCHEMA:"));
    }

    #[test]
    fn empty_directory_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (failed, out) = report(dir.path(), &ValidateArgs::default());
        assert!(!failed);
        assert!(out.starts_with("WARN: no topic modules found"));
    }

    #[test]
    fn run_validate_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let topics = dir.path().join("topics");
        std::fs::create_dir_all(&topics).unwrap();
        write_module(&topics, "a.json", &module("a"));
        let config = TopicsConfig::default();

        assert_eq!(run_validate(&ValidateArgs::default(), dir.path(), &config).unwrap(), 0);

        write_module(&topics, "b.json", &json!([]));
        assert_eq!(run_validate(&ValidateArgs::default(), dir.path(), &config).unwrap(), 1);
    }

    #[test]
    fn strict_flag_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let topics = dir.path().join("topics");
        std::fs::create_dir_all(&topics).unwrap();
        let mut m = module("dated");
        m["meta"]["created"] = json!("someday");
        write_module(&topics, "dated.json", &m);
        let config = TopicsConfig::default();

        assert_eq!(run_validate(&ValidateArgs::default(), dir.path(), &config).unwrap(), 0);
        let strict = ValidateArgs {
            strict: true,
            ..ValidateArgs::default()
        };
        assert_eq!(run_validate(&strict, dir.path(), &config).unwrap(), 1);
    }

    #[test]
    fn missing_source_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_validate(&ValidateArgs::default(), dir.path(), &TopicsConfig::default());
        assert!(result.is_err());
    }
}
