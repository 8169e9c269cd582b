//! Integration test: load the sample corpus under `topics/` and check the
//! catalog end to end (discovery, validation, normalization, keys, links).

use std::path::PathBuf;

use serde_json::json;
use topics_core::{ContentBlock, ListStyle, TopicId};
use topics_schema::{load_dir, FailureReason, Loader, LoaderOptions, RawModule};

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

#[test]
fn test_sample_corpus_loads_clean() {
    let catalog = load_dir(&repo_root().join("topics"), &Loader::default()).unwrap();

    for failure in catalog.failures() {
        eprintln!("FAIL: {}: {}", failure.label(), failure.reason);
    }
    assert!(catalog.is_complete());
    assert_eq!(catalog.warning_count(), 0);

    let ids: Vec<&str> = catalog.modules().keys().map(TopicId::as_str).collect();
    assert_eq!(ids, vec!["http-basics", "java-streams", "java-strings", "sql-joins"]);
}

#[test]
fn test_corpus_is_normalized() {
    let catalog = load_dir(&repo_root().join("topics"), &Loader::default()).unwrap();

    for loaded in catalog.modules().values() {
        for block in &loaded.module.content {
            if let ContentBlock::List { style, .. } = block {
                assert!(style.is_canonical(), "{}: {style}", loaded.label());
            }
        }
    }

    let strings = catalog.get(&TopicId::new("java-strings")).unwrap();
    assert_eq!(strings.meta.keywords, vec!["string", "immutability", "StringBuilder"]);
    assert_eq!(
        strings.content[1],
        ContentBlock::Paragraph {
            text: "A String is an immutable sequence of UTF-16 code units.".into()
        }
    );
    // Code is verbatim.
    match &strings.content[4] {
        ContentBlock::Code { code, .. } => assert!(code.contains("\"  world\"")),
        other => panic!("expected code block, got {other:?}"),
    }

    let streams = catalog.get(&TopicId::new("java-streams")).unwrap();
    assert!(matches!(
        streams.content[3],
        ContentBlock::List { style: ListStyle::Ordered, .. }
    ));
}

#[test]
fn test_title_slug_becomes_id() {
    let catalog = load_dir(&repo_root().join("topics"), &Loader::default()).unwrap();
    let joins = &catalog.modules()[&TopicId::new("sql-joins")];
    assert_eq!(joins.module.meta.id, Some(TopicId::new("sql-joins")));
    assert_eq!(joins.origin.as_deref(), Some("sql/sql-joins.json"));
}

#[test]
fn test_corpus_links_resolve() {
    let catalog = load_dir(&repo_root().join("topics"), &Loader::default()).unwrap();
    assert!(catalog.dangling_links().is_empty());
}

#[test]
fn test_digests_are_stable_across_loads() {
    let root = repo_root().join("topics");
    let first = load_dir(&root, &Loader::default()).unwrap();
    let second = load_dir(&root, &Loader::default()).unwrap();
    for (id, loaded) in first.modules() {
        assert_eq!(
            loaded.digest().unwrap(),
            second.modules()[id].digest().unwrap(),
            "digest changed for {id}"
        );
    }
}

#[test]
fn test_one_malformed_module_among_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let src = repo_root().join("topics");
    for rel in ["java/java-strings.json", "sql/sql-joins.json"] {
        let to = dir.path().join(rel);
        std::fs::create_dir_all(to.parent().unwrap()).unwrap();
        std::fs::copy(src.join(rel), to).unwrap();
    }
    std::fs::write(
        dir.path().join("broken.json"),
        json!({"meta": {"title": "Broken", "difficulty": "expert"}, "content": [{"type": "video"}]})
            .to_string(),
    )
    .unwrap();

    let catalog = load_dir(dir.path(), &Loader::default()).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.failures().len(), 1);

    let failure = &catalog.failures()[0];
    assert_eq!(failure.origin.as_deref(), Some("broken.json"));
    assert_eq!(failure.id, Some(TopicId::new("broken")));
    match &failure.reason {
        FailureReason::Invalid { errors } => {
            let paths: Vec<_> = errors.diagnostics().iter().map(|d| d.path.to_string()).collect();
            assert_eq!(
                paths,
                vec!["meta.description", "meta.category", "meta.difficulty", "content[0].type"]
            );
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn test_strict_mode_over_batch() {
    let skipping = json!({
        "meta": {"id": "skips", "title": "Skips", "description": "d", "category": "c", "difficulty": "beginner"},
        "content": [
            {"type": "heading", "level": 1, "text": "A"},
            {"type": "heading", "level": 3, "text": "C"}
        ]
    });
    let loader = Loader::new(LoaderOptions {
        strict: true,
        ..LoaderOptions::default()
    });
    let catalog = loader.load_all(vec![RawModule::new(skipping).with_origin("inline")]);
    assert!(catalog.is_empty());
    assert!(matches!(
        catalog.failures()[0].reason,
        FailureReason::WarningsAsErrors { .. }
    ));
}
