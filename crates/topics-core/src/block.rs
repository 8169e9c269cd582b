//! # Content Blocks
//!
//! A topic's `content` is an ordered sequence of [`ContentBlock`] values, one
//! per renderable unit. The `type` discriminant selects the variant; the set
//! of discriminants is closed and listed in [`ContentBlock::TYPES`].
//!
//! Enumerated fields keep the spelling they were authored with. In particular
//! [`ListStyle`] accepts `disc` and `number` alongside `unordered` and
//! `ordered`; [`ListStyle::canonical`] maps the synonyms onto the canonical pair.

use serde::{Deserialize, Serialize};

/// One renderable unit of topic content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Section heading. Level jumps between consecutive headings are allowed.
    Heading {
        level: HeadingLevel,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor: Option<String>,
    },
    /// Prose paragraph.
    Paragraph { text: String },
    /// Bulleted or numbered list.
    List { style: ListStyle, items: Vec<String> },
    /// Table. Rows may be ragged relative to `headers`.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Code sample. `language` is a free-form tag (`java`, `sql`, `text`, ...).
    Code { language: String, code: String },
    /// Callout box.
    Alert {
        variant: AlertVariant,
        content: String,
    },
}

impl ContentBlock {
    /// Every valid `type` discriminant, in declaration order.
    pub const TYPES: [&'static str; 6] = ["heading", "paragraph", "list", "table", "code", "alert"];

    /// The `type` discriminant of this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::List { .. } => "list",
            Self::Table { .. } => "table",
            Self::Code { .. } => "code",
            Self::Alert { .. } => "alert",
        }
    }

    /// Whether `name` is one of the known discriminants.
    pub fn is_known_type(name: &str) -> bool {
        Self::TYPES.contains(&name)
    }
}

/// Heading level, restricted to 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Smallest permitted level.
    pub const MIN: u8 = 1;
    /// Largest permitted level.
    pub const MAX: u8 = 3;

    /// Returns `None` outside `1..=3`.
    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    /// The numeric level.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level).ok_or_else(|| format!("heading level must be 1, 2 or 3, got {level}"))
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

/// List marker style as authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    /// Bulleted list (canonical).
    Unordered,
    /// Synonym of [`ListStyle::Unordered`].
    Disc,
    /// Numbered list (canonical).
    Ordered,
    /// Synonym of [`ListStyle::Ordered`].
    Number,
}

impl ListStyle {
    /// All accepted spellings.
    pub fn all() -> &'static [ListStyle] {
        &[Self::Unordered, Self::Disc, Self::Ordered, Self::Number]
    }

    /// Parse an authored spelling. Matching is exact.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unordered" => Some(Self::Unordered),
            "disc" => Some(Self::Disc),
            "ordered" => Some(Self::Ordered),
            "number" => Some(Self::Number),
            _ => None,
        }
    }

    /// The authored spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unordered => "unordered",
            Self::Disc => "disc",
            Self::Ordered => "ordered",
            Self::Number => "number",
        }
    }

    /// Map synonyms onto `Unordered` / `Ordered`.
    pub fn canonical(self) -> Self {
        match self {
            Self::Unordered | Self::Disc => Self::Unordered,
            Self::Ordered | Self::Number => Self::Ordered,
        }
    }

    /// Whether this is already a canonical spelling.
    pub fn is_canonical(self) -> bool {
        self.canonical() == self
    }
}

impl std::fmt::Display for ListStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual variant of an alert callout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertVariant {
    Info,
    Warning,
    Danger,
    Error,
}

impl AlertVariant {
    /// All accepted variants.
    pub fn all() -> &'static [AlertVariant] {
        &[Self::Info, Self::Warning, Self::Danger, Self::Error]
    }

    /// Parse an authored variant. Matching is exact.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "danger" => Some(Self::Danger),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AlertVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
