//! # Published Schema
//!
//! A JSON Schema (Draft 2020-12) description of the raw topic module shape,
//! for editors and external tooling. It mirrors the structural rules of
//! [`crate::validate`]: required keys, value types, enumerations and the
//! per-`type` block fields. Non-fatal findings (ragged tables, heading skips,
//! bad dates) are outside its reach.
//!
//! [`cross_check`] runs a raw value through the schema with the `jsonschema`
//! crate. It is an independent second opinion on the hand-written validator,
//! not a replacement for it: its messages carry JSON Pointers rather than the
//! dotted paths of [`crate::diagnostics::FieldPath`].

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use topics_core::ContentBlock;

/// `$id` of the published schema.
pub const SCHEMA_ID: &str = "https://schemas.momentum-sez.org/topics/topic-module.schema.json";

/// One schema violation reported by the cross-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// JSON Pointer to the offending value; empty for the root.
    pub instance_path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.instance_path.is_empty() {
            "/"
        } else {
            self.instance_path.as_str()
        };
        write!(f, "{path}: {}", self.message)
    }
}

/// The published schema document did not compile.
#[derive(Error, Debug)]
#[error("failed to compile topic schema: {0}")]
pub struct SchemaCompileError(pub String);

/// Build the schema document.
pub fn topic_module_schema() -> Value {
    let nonblank = json!({"type": "string", "pattern": "\\S"});
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    let optional_string = json!({"type": ["string", "null"]});

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": SCHEMA_ID,
        "title": "Topic module",
        "type": "object",
        "required": ["meta", "content"],
        "properties": {
            "meta": {
                "type": "object",
                "required": ["title", "description", "category", "difficulty"],
                "properties": {
                    "id": optional_string,
                    "title": nonblank,
                    "description": nonblank,
                    "category": nonblank,
                    "subcategory": optional_string,
                    "difficulty": {"enum": ["beginner", "intermediate", "advanced"]},
                    "duration": {"type": ["integer", "null"], "minimum": 1},
                    "keywords": {"anyOf": [string_list, {"type": "null"}]},
                    "prerequisites": {"anyOf": [string_list, {"type": "null"}]},
                    "created": optional_string,
                    "updated": optional_string
                }
            },
            "content": {"type": "array", "items": {"$ref": "#/$defs/block"}},
            "summary": {
                "type": ["object", "null"],
                "properties": {
                    "keyPoints": {"anyOf": [string_list, {"type": "null"}]},
                    "cheatSheet": {
                        "type": ["object", "null"],
                        "additionalProperties": {"type": "string"}
                    }
                }
            },
            "nextSteps": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "required": ["topicId", "reason"],
                    "properties": {
                        "topicId": {"type": "string"},
                        "reason": {"type": "string"}
                    }
                }
            }
        },
        "$defs": {
            "block": block_schema()
        }
    })
}

/// Discriminated union over `type`, expressed as `if`/`then` pairs so an
/// unknown `type` yields one `enum` violation instead of six `oneOf` misses.
fn block_schema() -> Value {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    let variant = |kind: &str, required: &[&str], properties: Value| {
        json!({
            "if": {"properties": {"type": {"const": kind}}, "required": ["type"]},
            "then": {"required": required, "properties": properties}
        })
    };

    json!({
        "type": "object",
        "required": ["type"],
        "properties": {"type": {"enum": ContentBlock::TYPES}},
        "allOf": [
            variant("heading", &["level", "text"], json!({
                "level": {"type": "integer", "minimum": 1, "maximum": 3},
                "text": {"type": "string"},
                "anchor": {"type": ["string", "null"]}
            })),
            variant("paragraph", &["text"], json!({"text": {"type": "string"}})),
            variant("list", &["style", "items"], json!({
                "style": {"enum": ["unordered", "disc", "ordered", "number"]},
                "items": string_list
            })),
            variant("table", &["headers", "rows"], json!({
                "headers": string_list,
                "rows": {"type": "array", "items": string_list}
            })),
            variant("code", &["language", "code"], json!({
                "language": {"type": "string"},
                "code": {"type": "string"}
            })),
            variant("alert", &["variant", "content"], json!({
                "variant": {"enum": ["info", "warning", "danger", "error"]},
                "content": {"type": "string"}
            }))
        ]
    })
}

/// Compiled form of [`topic_module_schema`], reusable across many modules.
pub struct TopicSchema {
    validator: jsonschema::Validator,
}

impl TopicSchema {
    pub fn new() -> Result<Self, SchemaCompileError> {
        let schema = topic_module_schema();
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(&schema)
            .map_err(|e| SchemaCompileError(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Every schema violation in `raw`; empty when it conforms.
    pub fn check(&self, raw: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(raw)
            .map(|err| SchemaViolation {
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }
}

impl std::fmt::Debug for TopicSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicSchema").field("id", &SCHEMA_ID).finish()
    }
}

/// Compile the schema and check one value against it.
pub fn cross_check(raw: &Value) -> Result<Vec<SchemaViolation>, SchemaCompileError> {
    Ok(TopicSchema::new()?.check(raw))
}
