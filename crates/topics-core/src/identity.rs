//! # Topic Identifiers
//!
//! [`TopicId`] names a topic module. Authored modules usually carry an
//! explicit `meta.id`; when they do not, the loader derives one from the
//! title with [`TopicId::slugify`].
//!
//! Identifiers referenced from `nextSteps` and `prerequisites` are weak
//! references: nothing here guarantees that the target topic exists.

use serde::{Deserialize, Serialize};

/// Identifier of a topic module, e.g. `java-collections`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    /// Wrap an identifier string as-is.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive a slug identifier from free text (usually a title).
    ///
    /// Letters and digits are lowercased and kept; every other run of
    /// characters becomes a single `-`. Leading and trailing separators are
    /// dropped. Returns `None` when nothing alphanumeric remains.
    ///
    /// ```
    /// use topics_core::TopicId;
    ///
    /// let id = TopicId::slugify("Java Collections: List vs. Set").unwrap();
    /// assert_eq!(id.as_str(), "java-collections-list-vs-set");
    /// ```
    pub fn slugify(text: &str) -> Option<Self> {
        let mut slug = String::with_capacity(text.len());
        let mut pending_sep = false;
        for c in text.chars() {
            if c.is_alphanumeric() {
                if pending_sep && !slug.is_empty() {
                    slug.push('-');
                }
                pending_sep = false;
                slug.extend(c.to_lowercase());
            } else {
                pending_sep = true;
            }
        }
        if slug.is_empty() {
            None
        } else {
            Some(Self(slug))
        }
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
