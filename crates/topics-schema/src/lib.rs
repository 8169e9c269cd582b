//! # topics-schema — Validation, Normalization & Loading
//!
//! Turns untyped topic modules into a keyed, normalized [`Catalog`].
//!
//! ## Responsibilities
//!
//! - **Validation:** [`validate()`] checks a raw `serde_json::Value` against
//!   the topic model and accumulates every violation with its path.
//! - **Normalization:** [`normalize()`] canonicalizes list-style synonyms and
//!   prose whitespace. It is idempotent.
//! - **Loading:** [`load_all`] / [`Loader`] run both steps over a batch,
//!   isolate failures per module and key results by topic id.
//! - **Sources:** [`source::load_dir`] reads `.json`/`.yaml` modules from disk.
//! - **Published schema:** [`export::topic_module_schema`] describes the raw
//!   shape as JSON Schema for external tooling.
//!
//! ## Design
//!
//! Validation is hand-written rather than schema-driven so that findings carry
//! the project's own [`ViolationKind`] taxonomy and dotted paths. The JSON
//! Schema document is kept alongside as a cross-check.

pub mod diagnostics;
pub mod export;
pub mod loader;
pub mod normalize;
pub mod source;
pub mod validate;

pub use diagnostics::{FieldPath, Severity, ValidationError, ValidationErrors, ViolationKind};
pub use export::{
    cross_check, topic_module_schema, SchemaCompileError, SchemaViolation, TopicSchema,
};
pub use loader::{
    load_all, Catalog, DanglingLink, FailureReason, LinkKind, LoadFailure, LoadedModule, Loader,
    LoaderOptions, RawModule,
};
pub use normalize::{normalize, NormalizeOptions, Normalizer};
pub use source::{load_dir, SourceError};
pub use validate::{validate, HeadingSkipPolicy, Validated, ValidationPolicy, Validator};
