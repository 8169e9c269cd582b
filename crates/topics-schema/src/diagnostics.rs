//! # Validation Diagnostics
//!
//! Structured findings produced by the validator. Each [`ValidationError`]
//! carries a [`ViolationKind`], the [`FieldPath`] of the offending value and a
//! human-readable message. Kinds ending in `Warning` are non-fatal: a module
//! that has only warnings still validates.
//!
//! Paths use dotted/indexed notation (`meta.title`, `content[3].items[1]`).
//! The document root renders as `(root)`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Location of a value inside a raw topic module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Path of an object member below this one.
    pub fn key(&self, key: &str) -> Self {
        if self.0.is_empty() {
            Self(key.to_string())
        } else {
            Self(format!("{}.{key}", self.0))
        }
    }

    /// Path of a sequence element below this one.
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw path string; empty for the root.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Whether a finding rejects the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    /// A required key is absent, null or an empty string.
    MissingField,
    /// A value is present but has the wrong JSON type.
    TypeMismatch,
    /// `content[i].type` is not one of the six block discriminants.
    UnknownBlockType,
    /// A value lies outside its enumerated set.
    InvalidEnumValue,
    /// A number lies outside its permitted range.
    OutOfRange,
    /// A table row's cell count differs from its header count.
    RaggedTableWarning,
    /// A heading is more than one level deeper than the previous heading.
    HeadingLevelSkipWarning,
    /// `meta.created` / `meta.updated` is not a recognizable date.
    InvalidDateWarning,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingField
            | Self::TypeMismatch
            | Self::UnknownBlockType
            | Self::InvalidEnumValue
            | Self::OutOfRange => Severity::Error,
            Self::RaggedTableWarning | Self::HeadingLevelSkipWarning | Self::InvalidDateWarning => {
                Severity::Warning
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "MissingField",
            Self::TypeMismatch => "TypeMismatch",
            Self::UnknownBlockType => "UnknownBlockType",
            Self::InvalidEnumValue => "InvalidEnumValue",
            Self::OutOfRange => "OutOfRange",
            Self::RaggedTableWarning => "RaggedTableWarning",
            Self::HeadingLevelSkipWarning => "HeadingLevelSkipWarning",
            Self::InvalidDateWarning => "InvalidDateWarning",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ViolationKind,
    pub path: FieldPath,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ViolationKind, path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    pub fn missing_field(path: &FieldPath) -> Self {
        Self::new(ViolationKind::MissingField, path.clone(), "required field is missing")
    }

    pub fn empty_field(path: &FieldPath) -> Self {
        Self::new(ViolationKind::MissingField, path.clone(), "required field must not be empty")
    }

    pub fn type_mismatch(path: &FieldPath, expected: &str, found: &Value) -> Self {
        Self::new(
            ViolationKind::TypeMismatch,
            path.clone(),
            format!("expected {expected}, found {}", json_type_name(found)),
        )
    }

    pub fn invalid_enum(path: &FieldPath, found: impl fmt::Display, allowed: &[&str]) -> Self {
        Self::new(
            ViolationKind::InvalidEnumValue,
            path.clone(),
            format!("\"{found}\" is not one of: {}", allowed.join(", ")),
        )
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.kind)
    }
}

impl std::error::Error for ValidationError {}

/// Every finding for a module that failed validation, in discovery order.
///
/// Always holds at least one error-severity finding; warnings found
/// in the same pass are kept alongside them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    diagnostics: Vec<ValidationError>,
}

impl ValidationErrors {
    pub(crate) fn new(diagnostics: Vec<ValidationError>) -> Self {
        Self { diagnostics }
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All findings, errors and warnings interleaved in discovery order.
    pub fn diagnostics(&self) -> &[ValidationError] {
        &self.diagnostics
    }

    /// Error-severity findings only.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.diagnostics.iter().filter(|d| !d.is_warning())
    }

    /// Warning-severity findings only.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Findings of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &ValidationError> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.diagnostics
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// JSON type name used in mismatch messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_building() {
        let p = FieldPath::root().key("content").index(3).key("items").index(1);
        assert_eq!(p.to_string(), "content[3].items[1]");
        assert_eq!(FieldPath::root().key("meta").key("title").as_str(), "meta.title");
    }

    #[test]
    fn root_path_display() {
        assert!(FieldPath::root().is_root());
        assert_eq!(FieldPath::root().to_string(), "(root)");
    }

    #[test]
    fn severities() {
        assert_eq!(ViolationKind::MissingField.severity(), Severity::Error);
        assert_eq!(ViolationKind::OutOfRange.severity(), Severity::Error);
        assert_eq!(ViolationKind::RaggedTableWarning.severity(), Severity::Warning);
        assert_eq!(ViolationKind::HeadingLevelSkipWarning.severity(), Severity::Warning);
        assert_eq!(ViolationKind::InvalidDateWarning.severity(), Severity::Warning);
    }

    #[test]
    fn type_mismatch_message_names_found_type() {
        let path = FieldPath::root().key("meta").key("title");
        let e = ValidationError::type_mismatch(&path, "string", &json!(42));
        assert_eq!(e.kind, ViolationKind::TypeMismatch);
        assert_eq!(e.to_string(), "meta.title: expected string, found number (TypeMismatch)");
    }

    #[test]
    fn invalid_enum_lists_allowed_values() {
        let path = FieldPath::root().key("meta").key("difficulty");
        let e = ValidationError::invalid_enum(
            &path,
            "expert",
            &["beginner", "intermediate", "advanced"],
        );
        assert!(e.message.contains("\"expert\""));
        assert!(e.message.contains("beginner, intermediate, advanced"));
    }

    #[test]
    fn errors_and_warnings_partition() {
        let errs = ValidationErrors::new(vec![
            ValidationError::missing_field(&FieldPath::root().key("meta")),
            ValidationError::new(
                ViolationKind::RaggedTableWarning,
                FieldPath::root().key("content").index(0).key("rows").index(1),
                "row has 1 cells, header has 2",
            ),
        ]);
        assert_eq!(errs.len(), 2);
        assert_eq!(errs.errors().count(), 1);
        assert_eq!(errs.warnings().count(), 1);
        assert_eq!(errs.of_kind(ViolationKind::MissingField).count(), 1);
        let shown = errs.to_string();
        assert!(shown.contains("meta: required field is missing"));
        assert!(shown.contains("content[0].rows[1]"));
    }
}
