//! # Topic Validation
//!
//! Turns an untyped `serde_json::Value` into a typed [`TopicModule`], or into
//! the complete list of everything wrong with it.
//!
//! ## Accumulation
//!
//! The validator never stops at the first problem. Every section (`meta`,
//! `content`, `summary`, `nextSteps`) is checked in that order and every
//! violation is recorded, so one run gives an author the full diagnostic.
//! Within `content`, a block with an unknown `type` yields exactly one
//! `UnknownBlockType` finding; its remaining fields are not inspected.
//!
//! ## Leniency
//!
//! Unknown keys are ignored. Optional fields may be absent or `null`.
//! Ragged tables, heading level jumps and unparseable dates are warnings,
//! never rejections. Referenced topic ids (`nextSteps`, `prerequisites`) are
//! not resolved here.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use topics_core::{
    parse_topic_date, AlertVariant, ContentBlock, Difficulty, HeadingLevel, ListStyle, NextStep,
    Summary, TopicId, TopicMeta, TopicModule,
};

use crate::diagnostics::{FieldPath, ValidationError, ValidationErrors, ViolationKind};

const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];
const LIST_STYLES: [&str; 4] = ["unordered", "disc", "ordered", "number"];
const ALERT_VARIANTS: [&str; 4] = ["info", "warning", "danger", "error"];
const HEADING_LEVELS: [&str; 3] = ["1", "2", "3"];

/// What to do when a heading is more than one level deeper than the last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingSkipPolicy {
    /// Report a `HeadingLevelSkipWarning`.
    #[default]
    Warn,
    /// Say nothing.
    Allow,
}

/// Tunable validation behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub heading_skips: HeadingSkipPolicy,
}

/// A module that passed validation, plus the non-fatal findings about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub module: TopicModule,
    pub warnings: Vec<ValidationError>,
}

/// Validate a raw module with the default policy.
pub fn validate(raw: &Value) -> Result<Validated, ValidationErrors> {
    Validator::default().validate(raw)
}

/// Validator configured with a [`ValidationPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Validate one raw module.
    ///
    /// # Errors
    ///
    /// Returns every finding (errors and warnings, in discovery order) when
    /// at least one error-severity violation is present.
    pub fn validate(&self, raw: &Value) -> Result<Validated, ValidationErrors> {
        let mut pass = Pass::new(&self.policy);

        let Some(root) = raw.as_object() else {
            pass.push(ValidationError::type_mismatch(&FieldPath::root(), "object", raw));
            return Err(ValidationErrors::new(pass.diagnostics));
        };

        let meta = pass.meta(root);
        let content = pass.content(root);
        let summary = pass.summary(root);
        let next_steps = pass.next_steps(root);

        // Every section returns `None` only after recording an error.
        match (meta, content, summary, next_steps) {
            (Some(meta), Some(content), Some(summary), Some(next_steps)) if !pass.has_errors() => {
                Ok(Validated {
                    module: TopicModule {
                        meta,
                        content,
                        summary,
                        next_steps,
                    },
                    warnings: pass.diagnostics,
                })
            }
            _ => Err(ValidationErrors::new(pass.diagnostics)),
        }
    }
}

/// One validation run over one module.
struct Pass<'a> {
    policy: &'a ValidationPolicy,
    diagnostics: Vec<ValidationError>,
}

impl<'a> Pass<'a> {
    fn new(policy: &'a ValidationPolicy) -> Self {
        Self {
            policy,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, diagnostic: ValidationError) {
        self.diagnostics.push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_warning())
    }

    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    fn meta(&mut self, root: &Map<String, Value>) -> Option<TopicMeta> {
        let path = FieldPath::root().key("meta");
        let meta = match present(root, "meta") {
            None => {
                self.push(ValidationError::missing_field(&path));
                return None;
            }
            Some(Value::Object(m)) => m,
            Some(other) => {
                self.push(ValidationError::type_mismatch(&path, "object", other));
                return None;
            }
        };

        let title = self.required_text(meta, "title", &path);
        let description = self.required_text(meta, "description", &path);
        let category = self.required_text(meta, "category", &path);
        let difficulty = self.difficulty(meta, &path);
        let id = self.optional_string(meta, "id", &path);
        let subcategory = self.optional_string(meta, "subcategory", &path);
        let duration = self.duration(meta, &path);
        let keywords = self.optional_string_list(meta, "keywords", &path);
        let prerequisites = self.optional_string_list(meta, "prerequisites", &path);
        let created = self.date(meta, "created", &path);
        let updated = self.date(meta, "updated", &path);

        Some(TopicMeta {
            id: id?.map(TopicId::new),
            title: title?,
            description: description?,
            category: category?,
            subcategory: subcategory?,
            difficulty: difficulty?,
            duration: duration?,
            keywords: keywords?.unwrap_or_default(),
            prerequisites: prerequisites?
                .unwrap_or_default()
                .into_iter()
                .map(TopicId::new)
                .collect::<BTreeSet<_>>(),
            created: created?,
            updated: updated?,
        })
    }

    fn content(&mut self, root: &Map<String, Value>) -> Option<Vec<ContentBlock>> {
        let path = FieldPath::root().key("content");
        let items = match present(root, "content") {
            None => {
                self.push(ValidationError::missing_field(&path));
                return None;
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.push(ValidationError::type_mismatch(&path, "array", other));
                return None;
            }
        };

        let mut blocks = Vec::with_capacity(items.len());
        let mut headings: Vec<(usize, u8)> = Vec::new();
        let mut all_ok = true;
        for (i, raw) in items.iter().enumerate() {
            match self.block(raw, &path.index(i)) {
                Some(block) => {
                    if let ContentBlock::Heading { level, .. } = &block {
                        headings.push((i, level.get()));
                    }
                    blocks.push(block);
                }
                None => all_ok = false,
            }
        }

        if self.policy.heading_skips == HeadingSkipPolicy::Warn {
            for pair in headings.windows(2) {
                let (_, prev) = pair[0];
                let (i, level) = pair[1];
                if level > prev + 1 {
                    self.push(ValidationError::new(
                        ViolationKind::HeadingLevelSkipWarning,
                        path.index(i).key("level"),
                        format!("heading level jumps from {prev} to {level}"),
                    ));
                }
            }
        }

        all_ok.then_some(blocks)
    }

    fn summary(&mut self, root: &Map<String, Value>) -> Option<Option<Summary>> {
        let path = FieldPath::root().key("summary");
        let summary = match present(root, "summary") {
            None => return Some(None),
            Some(Value::Object(m)) => m,
            Some(other) => {
                self.push(ValidationError::type_mismatch(&path, "object", other));
                return None;
            }
        };

        let key_points = self.optional_string_list(summary, "keyPoints", &path);
        let cheat_sheet = self.cheat_sheet(summary, &path);

        Some(Some(Summary {
            key_points: key_points?.unwrap_or_default(),
            cheat_sheet: cheat_sheet?,
        }))
    }

    fn next_steps(&mut self, root: &Map<String, Value>) -> Option<Vec<NextStep>> {
        let path = FieldPath::root().key("nextSteps");
        let items = match present(root, "nextSteps") {
            None => return Some(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.push(ValidationError::type_mismatch(&path, "array", other));
                return None;
            }
        };

        let mut steps = Vec::with_capacity(items.len());
        let mut all_ok = true;
        for (i, raw) in items.iter().enumerate() {
            let item_path = path.index(i);
            let Some(obj) = raw.as_object() else {
                self.push(ValidationError::type_mismatch(&item_path, "object", raw));
                all_ok = false;
                continue;
            };

            // Content blocks pasted into nextSteps: one finding per entry.
            if !obj.contains_key("topicId") {
                if let Some(kind) = obj.get("type").and_then(Value::as_str) {
                    self.push(ValidationError::new(
                        ViolationKind::TypeMismatch,
                        item_path,
                        format!(
                            "expected a {{topicId, reason}} pair, found a \"{kind}\" content block"
                        ),
                    ));
                    all_ok = false;
                    continue;
                }
            }

            let topic_id = self.required_text(obj, "topicId", &item_path);
            let reason = self.required_string(obj, "reason", &item_path);
            match (topic_id, reason) {
                (Some(topic_id), Some(reason)) => steps.push(NextStep {
                    topic_id: TopicId::new(topic_id),
                    reason,
                }),
                _ => all_ok = false,
            }
        }

        all_ok.then_some(steps)
    }

    // -----------------------------------------------------------------------
    // Content blocks
    // -----------------------------------------------------------------------

    fn block(&mut self, raw: &Value, path: &FieldPath) -> Option<ContentBlock> {
        let Some(obj) = raw.as_object() else {
            self.push(ValidationError::type_mismatch(path, "object", raw));
            return None;
        };

        let type_path = path.key("type");
        let kind = match present(obj, "type") {
            None => {
                self.push(ValidationError::missing_field(&type_path));
                return None;
            }
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                self.push(ValidationError::type_mismatch(&type_path, "string", other));
                return None;
            }
        };

        match kind {
            "heading" => self.heading(obj, path),
            "paragraph" => {
                let text = self.required_string(obj, "text", path)?;
                Some(ContentBlock::Paragraph { text })
            }
            "list" => {
                let style = self.list_style(obj, path);
                let items = self.required_string_list(obj, "items", path);
                Some(ContentBlock::List {
                    style: style?,
                    items: items?,
                })
            }
            "table" => self.table(obj, path),
            "code" => {
                let language = self.required_string(obj, "language", path);
                let code = self.required_string(obj, "code", path);
                Some(ContentBlock::Code {
                    language: language?,
                    code: code?,
                })
            }
            "alert" => {
                let variant = self.alert_variant(obj, path);
                let content = self.required_string(obj, "content", path);
                Some(ContentBlock::Alert {
                    variant: variant?,
                    content: content?,
                })
            }
            unknown => {
                self.push(ValidationError::new(
                    ViolationKind::UnknownBlockType,
                    type_path,
                    format!(
                        "unknown block type \"{unknown}\"; expected one of: {}",
                        ContentBlock::TYPES.join(", ")
                    ),
                ));
                None
            }
        }
    }

    fn heading(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<ContentBlock> {
        let level_path = path.key("level");
        let level = match present(obj, "level") {
            None => {
                self.push(ValidationError::missing_field(&level_path));
                None
            }
            Some(Value::Number(n)) => match whole_number(n).and_then(|l| u8::try_from(l).ok()) {
                Some(l) => match HeadingLevel::new(l) {
                    Some(level) => Some(level),
                    None => {
                        self.push(ValidationError::invalid_enum(&level_path, l, &HEADING_LEVELS));
                        None
                    }
                },
                None => {
                    self.push(ValidationError::invalid_enum(&level_path, n, &HEADING_LEVELS));
                    None
                }
            },
            Some(other) => {
                self.push(ValidationError::type_mismatch(&level_path, "number", other));
                None
            }
        };
        let text = self.required_string(obj, "text", path);
        let anchor = self.optional_string(obj, "anchor", path);

        Some(ContentBlock::Heading {
            level: level?,
            text: text?,
            anchor: anchor?,
        })
    }

    fn table(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<ContentBlock> {
        let headers = self.required_string_list(obj, "headers", path);

        let rows_path = path.key("rows");
        let rows = match present(obj, "rows") {
            None => {
                self.push(ValidationError::missing_field(&rows_path));
                None
            }
            Some(Value::Array(raw_rows)) => {
                let mut rows = Vec::with_capacity(raw_rows.len());
                let mut all_ok = true;
                for (j, raw_row) in raw_rows.iter().enumerate() {
                    match self.string_list(raw_row, &rows_path.index(j)) {
                        Some(row) => rows.push(row),
                        None => all_ok = false,
                    }
                }
                all_ok.then_some(rows)
            }
            Some(other) => {
                self.push(ValidationError::type_mismatch(&rows_path, "array", other));
                None
            }
        };

        let (headers, rows) = (headers?, rows?);
        for (j, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                self.push(ValidationError::new(
                    ViolationKind::RaggedTableWarning,
                    rows_path.index(j),
                    format!("row has {} cells, header has {}", row.len(), headers.len()),
                ));
            }
        }

        Some(ContentBlock::Table { headers, rows })
    }

    // -----------------------------------------------------------------------
    // Enumerations and numbers
    // -----------------------------------------------------------------------

    fn difficulty(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<Difficulty> {
        let field = path.key("difficulty");
        let s = self.required_text(obj, "difficulty", path)?;
        let parsed = Difficulty::parse(&s);
        if parsed.is_none() {
            self.push(ValidationError::invalid_enum(&field, &s, &DIFFICULTIES));
        }
        parsed
    }

    fn list_style(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<ListStyle> {
        let field = path.key("style");
        let s = self.required_string(obj, "style", path)?;
        let parsed = ListStyle::parse(&s);
        if parsed.is_none() {
            self.push(ValidationError::invalid_enum(&field, &s, &LIST_STYLES));
        }
        parsed
    }

    fn alert_variant(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
    ) -> Option<AlertVariant> {
        let field = path.key("variant");
        let s = self.required_string(obj, "variant", path)?;
        let parsed = AlertVariant::parse(&s);
        if parsed.is_none() {
            self.push(ValidationError::invalid_enum(&field, &s, &ALERT_VARIANTS));
        }
        parsed
    }

    /// `Some(None)` when absent; `None` after recording an error.
    fn duration(&mut self, obj: &Map<String, Value>, path: &FieldPath) -> Option<Option<u32>> {
        let field = path.key("duration");
        let n = match present(obj, "duration") {
            None => return Some(None),
            Some(Value::Number(n)) => n,
            Some(other) => {
                self.push(ValidationError::type_mismatch(&field, "positive integer", other));
                return None;
            }
        };

        let Some(whole) = whole_number(n) else {
            self.push(ValidationError::new(
                ViolationKind::TypeMismatch,
                field,
                format!("expected positive integer, found {n}"),
            ));
            return None;
        };

        match u32::try_from(whole) {
            Ok(minutes) if minutes > 0 => Some(Some(minutes)),
            _ => {
                self.push(ValidationError::new(
                    ViolationKind::OutOfRange,
                    field,
                    format!("duration must be a positive number of minutes, got {whole}"),
                ));
                None
            }
        }
    }

    /// Optional date string; an unparseable value is kept and warned about.
    fn date(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<Option<String>> {
        let value = self.optional_string(obj, key, path)?;
        if let Some(s) = &value {
            if parse_topic_date(s).is_none() {
                self.push(ValidationError::new(
                    ViolationKind::InvalidDateWarning,
                    path.key(key),
                    format!("\"{s}\" is not a YYYY-MM-DD or RFC 3339 date"),
                ));
            }
        }
        Some(value)
    }

    fn cheat_sheet(
        &mut self,
        obj: &Map<String, Value>,
        path: &FieldPath,
    ) -> Option<BTreeMap<String, String>> {
        let field = path.key("cheatSheet");
        let entries = match present(obj, "cheatSheet") {
            None => return Some(BTreeMap::new()),
            Some(Value::Object(m)) => m,
            Some(other) => {
                self.push(ValidationError::type_mismatch(&field, "object", other));
                return None;
            }
        };

        let mut sheet = BTreeMap::new();
        let mut all_ok = true;
        for (term, value) in entries {
            match value {
                Value::String(s) => {
                    sheet.insert(term.clone(), s.clone());
                }
                other => {
                    self.push(ValidationError::type_mismatch(&field.key(term), "string", other));
                    all_ok = false;
                }
            }
        }
        all_ok.then_some(sheet)
    }

    // -----------------------------------------------------------------------
    // Strings
    // -----------------------------------------------------------------------

    /// Required string; any content, including empty, is accepted.
    fn required_string(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<String> {
        let field = path.key(key);
        match present(obj, key) {
            None => {
                self.push(ValidationError::missing_field(&field));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.push(ValidationError::type_mismatch(&field, "string", other));
                None
            }
        }
    }

    /// Required string that must contain something other than whitespace.
    fn required_text(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<String> {
        let s = self.required_string(obj, key, path)?;
        if s.trim().is_empty() {
            self.push(ValidationError::empty_field(&path.key(key)));
            return None;
        }
        Some(s)
    }

    /// `Some(None)` when absent; `None` after recording an error.
    fn optional_string(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<Option<String>> {
        match present(obj, key) {
            None => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                self.push(ValidationError::type_mismatch(&path.key(key), "string", other));
                None
            }
        }
    }

    fn required_string_list(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<Vec<String>> {
        let field = path.key(key);
        match present(obj, key) {
            None => {
                self.push(ValidationError::missing_field(&field));
                None
            }
            Some(value) => self.string_list(value, &field),
        }
    }

    fn optional_string_list(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &FieldPath,
    ) -> Option<Option<Vec<String>>> {
        match present(obj, key) {
            None => Some(None),
            Some(value) => self.string_list(value, &path.key(key)).map(Some),
        }
    }

    /// A sequence of strings. Every non-string element is reported.
    fn string_list(&mut self, value: &Value, path: &FieldPath) -> Option<Vec<String>> {
        let Some(items) = value.as_array() else {
            self.push(ValidationError::type_mismatch(path, "array of strings", value));
            return None;
        };

        let mut out = Vec::with_capacity(items.len());
        let mut all_ok = true;
        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) => out.push(s.clone()),
                other => {
                    self.push(ValidationError::type_mismatch(&path.index(i), "string", other));
                    all_ok = false;
                }
            }
        }
        all_ok.then_some(out)
    }
}

/// Look up a key, treating an explicit `null` as absent.
fn present<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// The value of a number with no fractional part (`15` or `15.0`).
fn whole_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.as_u64().is_some() {
        return Some(i64::MAX);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}
