//! # Catalog Loading
//!
//! Applies validation and normalization to a batch of raw modules and
//! assembles the survivors into a [`Catalog`] keyed by [`TopicId`].
//!
//! ## Fault Isolation
//!
//! Each module is processed on its own. A module that fails validation is
//! recorded as a [`LoadFailure`] and never affects any other module: the
//! loader does not return early, panic, or partially insert a bad module.
//! Validation and normalization of module *i* never read module *j*; only key
//! assignment looks at what is already in the catalog.
//!
//! ## Keys
//!
//! A module is keyed by `meta.id`, else by a slug of `meta.title`, else by
//! `topic-<index>`. The chosen key is written back into `meta.id`, so every
//! module in a catalog carries an id. When two modules author the same
//! `meta.id` the first one wins and the later one is reported as
//! [`FailureReason::DuplicateId`]. A derived key that is already taken gets a
//! `-2`, `-3`, ... suffix instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use topics_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, TopicId, TopicModule,
};

use crate::diagnostics::{ValidationError, ValidationErrors};
use crate::normalize::{NormalizeOptions, Normalizer};
use crate::validate::{ValidationPolicy, Validator};

/// An unvalidated module plus a description of where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawModule {
    /// File path, URL or any other label useful in reports.
    pub origin: Option<String>,
    pub value: Value,
}

impl RawModule {
    pub fn new(value: Value) -> Self {
        Self {
            origin: None,
            value,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

impl From<Value> for RawModule {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Loader configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub validation: ValidationPolicy,
    pub normalize: NormalizeOptions,
    /// Reject modules that only have warnings.
    pub strict: bool,
}

/// A module that made it into the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Position in the input batch.
    pub index: usize,
    pub origin: Option<String>,
    /// Normalized module; `meta.id` is always set.
    pub module: TopicModule,
    pub warnings: Vec<ValidationError>,
}

impl LoadedModule {
    /// SHA-256 over the canonical JSON of the normalized module.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        let bytes = CanonicalBytes::new(&self.module)?;
        Ok(sha256_digest(&bytes))
    }

    /// `origin` if known, else `#<index>`.
    pub fn label(&self) -> String {
        describe(self.index, self.origin.as_deref())
    }
}

/// Why a module was left out of the catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Structural violations.
    #[error("{} validation error(s):\n{errors}", .errors.errors().count())]
    Invalid { errors: ValidationErrors },

    /// Only warnings, but the loader runs in strict mode.
    #[error("{} warning(s) rejected in strict mode", .warnings.len())]
    WarningsAsErrors { warnings: Vec<ValidationError> },

    /// Another module already claimed the key.
    #[error("duplicate topic id \"{id}\" (first loaded from {first})")]
    DuplicateId { id: TopicId, first: String },

    /// The source could not be read or parsed at all.
    #[error("unreadable source: {reason}")]
    Unreadable { reason: String },
}

/// A module that was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    /// Position in the input batch.
    pub index: usize,
    /// Best-effort identifier read from the raw data.
    pub id: Option<TopicId>,
    pub origin: Option<String>,
    pub reason: FailureReason,
}

impl LoadFailure {
    /// `origin` if known, else the id, else `#<index>`.
    pub fn label(&self) -> String {
        match (&self.origin, &self.id) {
            (Some(origin), _) => origin.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => describe(self.index, None),
        }
    }
}

/// How a module refers to another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    NextStep,
    Prerequisite,
}

/// A reference to a topic id that is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingLink {
    pub from: TopicId,
    pub kind: LinkKind,
    pub target: TopicId,
}

/// Loaded modules keyed by id, plus every failure.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: BTreeMap<TopicId, LoadedModule>,
    failures: Vec<LoadFailure>,
}

impl Catalog {
    /// Loaded modules in id order.
    pub fn modules(&self) -> &BTreeMap<TopicId, LoadedModule> {
        &self.modules
    }

    pub fn get(&self, id: &TopicId) -> Option<&TopicModule> {
        self.modules.get(id).map(|m| &m.module)
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.modules.contains_key(id)
    }

    /// Failures in input order.
    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    /// Number of loaded modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Loaded plus failed.
    pub fn total(&self) -> usize {
        self.modules.len() + self.failures.len()
    }

    /// True when nothing failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Warnings across all loaded modules.
    pub fn warning_count(&self) -> usize {
        self.modules.values().map(|m| m.warnings.len()).sum()
    }

    /// References from loaded modules to ids that are not loaded.
    ///
    /// Informational only: a dangling reference never fails a module.
    pub fn dangling_links(&self) -> Vec<DanglingLink> {
        let mut dangling = Vec::new();
        for (id, loaded) in &self.modules {
            let module = &loaded.module;
            let prerequisites = module
                .meta
                .prerequisites
                .iter()
                .map(|t| (LinkKind::Prerequisite, t));
            let next_steps = module
                .next_steps
                .iter()
                .map(|s| (LinkKind::NextStep, &s.topic_id));
            for (kind, target) in prerequisites.chain(next_steps) {
                if !self.modules.contains_key(target) {
                    dangling.push(DanglingLink {
                        from: id.clone(),
                        kind,
                        target: target.clone(),
                    });
                }
            }
        }
        dangling
    }

    /// Only the `nextSteps` subset of [`dangling_links`](Self::dangling_links).
    pub fn dangling_next_steps(&self) -> Vec<DanglingLink> {
        self.dangling_links()
            .into_iter()
            .filter(|l| l.kind == LinkKind::NextStep)
            .collect()
    }

    /// Split into plain modules and failures.
    pub fn into_parts(self) -> (BTreeMap<TopicId, TopicModule>, Vec<LoadFailure>) {
        let modules = self
            .modules
            .into_iter()
            .map(|(id, loaded)| (id, loaded.module))
            .collect();
        (modules, self.failures)
    }

    /// Record a failure that happened before validation (e.g. a parse error).
    pub fn push_failure(&mut self, failure: LoadFailure) {
        self.failures.push(failure);
    }

    /// Resolve a key against the ids already loaded. Derived keys that are
    /// taken become `<key>-2`, `<key>-3`, ... until one is free.
    fn free_key(&self, key: TopicKey) -> TopicId {
        match key {
            TopicKey::Explicit(id) => id,
            TopicKey::Derived(id) if !self.modules.contains_key(&id) => id,
            TopicKey::Derived(id) => (2..)
                .map(|n| TopicId::new(format!("{id}-{n}")))
                .find(|candidate| !self.modules.contains_key(candidate))
                .unwrap_or(id),
        }
    }

    fn insert(&mut self, id: TopicId, loaded: LoadedModule) -> Result<(), FailureReason> {
        if let Some(first) = self.modules.get(&id) {
            return Err(FailureReason::DuplicateId {
                id,
                first: first.label(),
            });
        }
        self.modules.insert(id, loaded);
        Ok(())
    }
}

/// Load a batch of raw values with default options.
pub fn load_all<I>(raw_modules: I) -> Catalog
where
    I: IntoIterator,
    I::Item: Into<RawModule>,
{
    Loader::default().load_all(raw_modules)
}

/// Validator + normalizer pipeline.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    validator: Validator,
    normalizer: Normalizer,
    strict: bool,
}

impl Loader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            validator: Validator::new(options.validation),
            normalizer: Normalizer::new(options.normalize),
            strict: options.strict,
        }
    }

    /// Load every module in the batch into a fresh catalog.
    pub fn load_all<I>(&self, raw_modules: I) -> Catalog
    where
        I: IntoIterator,
        I::Item: Into<RawModule>,
    {
        let mut catalog = Catalog::default();
        for (index, raw) in raw_modules.into_iter().enumerate() {
            self.load_into(&mut catalog, index, raw.into());
        }
        tracing::info!(
            loaded = catalog.len(),
            failed = catalog.failures().len(),
            warnings = catalog.warning_count(),
            "topic catalog assembled"
        );
        catalog
    }

    /// Load one module at batch position `index` into an existing catalog.
    pub fn load_into(&self, catalog: &mut Catalog, index: usize, raw: RawModule) {
        let RawModule { origin, value } = raw;

        let outcome = self.process(&value).and_then(|(mut module, warnings)| {
            let id = catalog.free_key(topic_key(&module, index));
            module.meta.id = Some(id.clone());
            let loaded = LoadedModule {
                index,
                origin: origin.clone(),
                module,
                warnings,
            };
            catalog.insert(id.clone(), loaded).map(|()| id)
        });

        match outcome {
            Ok(id) => {
                tracing::debug!(index, id = %id, "loaded topic");
            }
            Err(reason) => {
                let failure = LoadFailure {
                    index,
                    id: raw_key(&value),
                    origin,
                    reason,
                };
                tracing::warn!(
                    index,
                    module = %failure.label(),
                    error = %failure.reason,
                    "topic failed to load"
                );
                catalog.push_failure(failure);
            }
        }
    }

    fn process(&self, raw: &Value) -> Result<(TopicModule, Vec<ValidationError>), FailureReason> {
        let validated = self
            .validator
            .validate(raw)
            .map_err(|errors| FailureReason::Invalid { errors })?;

        if self.strict && !validated.warnings.is_empty() {
            return Err(FailureReason::WarningsAsErrors {
                warnings: validated.warnings,
            });
        }

        Ok((self.normalizer.normalize(validated.module), validated.warnings))
    }
}

/// Where a module's catalog key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TopicKey {
    /// Authored `meta.id`; a clash is a duplicate.
    Explicit(TopicId),
    /// Title slug or `topic-<index>`; a clash gets a numeric suffix.
    Derived(TopicId),
}

/// Catalog key for a validated module.
fn topic_key(module: &TopicModule, index: usize) -> TopicKey {
    let explicit = module
        .meta
        .id
        .as_ref()
        .map(|id| id.as_str().trim())
        .filter(|id| !id.is_empty())
        .map(TopicId::new);
    match explicit {
        Some(id) => TopicKey::Explicit(id),
        None => TopicKey::Derived(
            TopicId::slugify(&module.meta.title)
                .unwrap_or_else(|| TopicId::new(format!("topic-{index}"))),
        ),
    }
}

/// Best-effort id of a module that could not be loaded.
fn raw_key(raw: &Value) -> Option<TopicId> {
    let meta = raw.get("meta")?;
    meta.get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(TopicId::new)
        .or_else(|| meta.get("title").and_then(Value::as_str).and_then(TopicId::slugify))
}

fn describe(index: usize, origin: Option<&str>) -> String {
    match origin {
        Some(origin) => origin.to_string(),
        None => format!("#{index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ViolationKind;
    use serde_json::json;
    use topics_core::{ContentBlock, ListStyle};

    fn topic(id: Option<&str>, title: &str) -> Value {
        let mut meta = json!({
            "title": title,
            "description": "A topic.",
            "category": "java",
            "difficulty": "beginner"
        });
        if let Some(id) = id {
            meta["id"] = json!(id);
        }
        json!({
            "meta": meta,
            "content": [
                {"type": "heading", "level": 1, "text": title},
                {"type": "list", "style": "disc", "items": ["a", "b"]}
            ]
        })
    }

    #[test]
    fn one_bad_module_among_many() {
        let bad = json!({"meta": {"title": "Broken"}, "content": "nope"});
        let catalog = load_all(vec![
            topic(Some("java-strings"), "Strings"),
            topic(Some("java-streams"), "Streams"),
            bad,
            topic(Some("sql-joins"), "Joins"),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.failures().len(), 1);
        assert_eq!(catalog.total(), 4);
        assert!(!catalog.is_complete());

        let failure = &catalog.failures()[0];
        assert_eq!(failure.index, 2);
        assert_eq!(failure.id, Some(TopicId::new("broken")));
        assert!(matches!(failure.reason, FailureReason::Invalid { .. }));

        for id in ["java-strings", "java-streams", "sql-joins"] {
            assert!(catalog.contains(&TopicId::new(id)), "missing {id}");
        }
    }

    #[test]
    fn loaded_modules_are_normalized() {
        let catalog = load_all(vec![topic(Some("java-lists"), "Lists")]);
        let module = catalog.get(&TopicId::new("java-lists")).unwrap();
        assert_eq!(
            module.content[1],
            ContentBlock::List {
                style: ListStyle::Unordered,
                items: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn missing_id_falls_back_to_title_slug() {
        let catalog = load_all(vec![topic(None, "Hibernate Basics")]);
        let id = TopicId::new("hibernate-basics");
        let module = catalog.get(&id).unwrap();
        assert_eq!(module.meta.id, Some(id));
    }

    #[test]
    fn unsluggable_title_falls_back_to_index() {
        let catalog = load_all(vec![topic(Some("a"), "A"), topic(None, "???")]);
        assert!(catalog.contains(&TopicId::new("topic-1")));
    }

    #[test]
    fn derived_key_never_collides_with_an_explicit_id() {
        let catalog = load_all(vec![
            topic(Some("topic-1"), "A"),
            topic(None, "???"),
            topic(Some("hibernate-basics"), "Other"),
            topic(None, "Hibernate Basics"),
        ]);
        assert!(catalog.is_complete(), "{:?}", catalog.failures());
        assert_eq!(catalog.len(), 4);
        let authored = catalog.get(&TopicId::new("topic-1")).unwrap();
        assert_eq!(authored.meta.title, "A");
        let suffixed = catalog.get(&TopicId::new("topic-1-2")).unwrap();
        assert_eq!(suffixed.meta.id, Some(TopicId::new("topic-1-2")));
        let slugged = catalog.get(&TopicId::new("hibernate-basics-2")).unwrap();
        assert_eq!(slugged.meta.title, "Hibernate Basics");
    }

    #[test]
    fn blank_id_is_ignored() {
        let catalog = load_all(vec![topic(Some("   "), "JSP Tags")]);
        assert!(catalog.contains(&TopicId::new("jsp-tags")));
    }

    #[test]
    fn duplicate_id_first_wins() {
        let catalog = Loader::default().load_all(vec![
            RawModule::new(topic(Some("dup"), "First")).with_origin("topics/first.json"),
            RawModule::new(topic(Some("dup"), "Second")).with_origin("topics/second.json"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&TopicId::new("dup")).unwrap().meta.title, "First");
        let failure = &catalog.failures()[0];
        assert_eq!(failure.origin.as_deref(), Some("topics/second.json"));
        match &failure.reason {
            FailureReason::DuplicateId { id, first } => {
                assert_eq!(id.as_str(), "dup");
                assert_eq!(first, "topics/first.json");
            }
            other => panic!("expected DuplicateId, got {other:?}"),
        }
    }

    #[test]
    fn strict_mode_rejects_warnings() {
        let mut raw = topic(Some("tables"), "Tables");
        raw["content"] = json!([{"type": "table", "headers": ["a", "b"], "rows": [["only one"]]}]);

        let lenient = load_all(vec![raw.clone()]);
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient.warning_count(), 1);

        let strict = Loader::new(LoaderOptions {
            strict: true,
            ..LoaderOptions::default()
        })
        .load_all(vec![raw]);
        assert!(strict.is_empty());
        match &strict.failures()[0].reason {
            FailureReason::WarningsAsErrors { warnings } => {
                assert_eq!(warnings[0].kind, ViolationKind::RaggedTableWarning)
            }
            other => panic!("expected WarningsAsErrors, got {other:?}"),
        }
    }

    #[test]
    fn next_steps_to_unknown_topics_still_load() {
        let mut raw = topic(Some("streams"), "Streams");
        raw["nextSteps"] = json!([
            {"topicId": "x", "reason": "y"},
            {"topicId": "collections", "reason": "back to basics"}
        ]);
        raw["meta"]["prerequisites"] = json!(["lambdas"]);
        let catalog = load_all(vec![raw, topic(Some("collections"), "Collections")]);
        assert_eq!(catalog.len(), 2);

        let dangling = catalog.dangling_links();
        assert_eq!(dangling.len(), 2);
        assert_eq!(catalog.dangling_next_steps().len(), 1);
        assert!(dangling.contains(&DanglingLink {
            from: TopicId::new("streams"),
            kind: LinkKind::NextStep,
            target: TopicId::new("x"),
        }));
        assert!(dangling.contains(&DanglingLink {
            from: TopicId::new("streams"),
            kind: LinkKind::Prerequisite,
            target: TopicId::new("lambdas"),
        }));
    }

    #[test]
    fn digest_ignores_raw_key_order_and_synonyms() {
        let a = json!({
            "meta": {"id": "t", "title": "T", "description": "d", "category": "c", "difficulty": "advanced"},
            "content": [{"type": "list", "style": "number", "items": ["x"]}]
        });
        let b = json!({
            "content": [{"items": ["x"], "style": "ordered", "type": "list"}],
            "meta": {"difficulty": "advanced", "category": "c", "description": "d", "title": "T", "id": "t"}
        });
        let da = load_all(vec![a]).modules()[&TopicId::new("t")].digest().unwrap();
        let db = load_all(vec![b]).modules()[&TopicId::new("t")].digest().unwrap();
        assert_eq!(da, db);
    }

    #[test]
    fn into_parts_returns_modules_and_failures() {
        let (modules, failures) =
            load_all(vec![topic(Some("ok"), "Ok"), json!("not an object")]).into_parts();
        assert_eq!(modules.len(), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].label(), "#1");
    }

    #[test]
    fn failure_reason_display() {
        let catalog = load_all(vec![json!({"meta": {}, "content": []})]);
        let shown = catalog.failures()[0].reason.to_string();
        assert!(shown.starts_with("4 validation error(s)"), "{shown}");
        assert!(shown.contains("meta.title"));
    }
}
