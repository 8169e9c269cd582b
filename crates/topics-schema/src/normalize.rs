//! # Normalization
//!
//! Canonicalizes the superficial inconsistencies that survive validation so
//! downstream consumers see one representation:
//!
//! - `list.style` synonyms collapse onto `unordered` / `ordered`.
//! - Prose fields are trimmed and internal whitespace runs become one space
//!   (when `collapse_whitespace` is on). Code blocks and table cells are
//!   verbatim and never touched.
//! - Blank and repeated keywords are dropped, first occurrence wins.
//! - With `derive_anchors`, headings without an anchor get a slug of their
//!   text, made unique within the module.
//!
//! Normalization is total and idempotent:
//! `normalize(normalize(m)) == normalize(m)`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use topics_core::{ContentBlock, NextStep, Summary, TopicId, TopicMeta, TopicModule};

/// Normalizer switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub collapse_whitespace: bool,
    pub derive_anchors: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            derive_anchors: false,
        }
    }
}

/// Normalize with default options.
pub fn normalize(module: TopicModule) -> TopicModule {
    Normalizer::default().normalize(module)
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn normalize(&self, module: TopicModule) -> TopicModule {
        let TopicModule {
            meta,
            content,
            summary,
            next_steps,
        } = module;

        let mut content: Vec<ContentBlock> =
            content.into_iter().map(|b| self.block(b)).collect();
        if self.options.derive_anchors {
            derive_anchors(&mut content);
        }

        TopicModule {
            meta: self.meta(meta),
            content,
            summary: summary.map(|s| self.summary(s)),
            next_steps: next_steps.into_iter().map(|s| self.next_step(s)).collect(),
        }
    }

    fn meta(&self, meta: TopicMeta) -> TopicMeta {
        let mut seen = HashSet::new();
        let keywords = meta
            .keywords
            .into_iter()
            .map(|k| self.prose(k))
            .filter(|k| !k.trim().is_empty() && seen.insert(k.clone()))
            .collect();

        TopicMeta {
            title: self.prose(meta.title),
            description: self.prose(meta.description),
            category: self.prose(meta.category),
            subcategory: meta.subcategory.map(|s| self.prose(s)),
            keywords,
            ..meta
        }
    }

    fn block(&self, block: ContentBlock) -> ContentBlock {
        match block {
            ContentBlock::Heading {
                level,
                text,
                anchor,
            } => ContentBlock::Heading {
                level,
                text: self.prose(text),
                anchor,
            },
            ContentBlock::Paragraph { text } => ContentBlock::Paragraph {
                text: self.prose(text),
            },
            ContentBlock::List { style, items } => ContentBlock::List {
                style: style.canonical(),
                items: items.into_iter().map(|i| self.prose(i)).collect(),
            },
            ContentBlock::Alert { variant, content } => ContentBlock::Alert {
                variant,
                content: self.prose(content),
            },
            verbatim @ (ContentBlock::Table { .. } | ContentBlock::Code { .. }) => verbatim,
        }
    }

    fn summary(&self, summary: Summary) -> Summary {
        Summary {
            key_points: summary
                .key_points
                .into_iter()
                .map(|p| self.prose(p))
                .collect(),
            cheat_sheet: summary.cheat_sheet,
        }
    }

    fn next_step(&self, step: NextStep) -> NextStep {
        NextStep {
            topic_id: step.topic_id,
            reason: self.prose(step.reason),
        }
    }

    fn prose(&self, text: String) -> String {
        if self.options.collapse_whitespace {
            collapse_whitespace(&text)
        } else {
            text
        }
    }
}

/// Trim, and replace every internal whitespace run with a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fill missing heading anchors with unique slugs of the heading text.
///
/// Existing anchors are reserved first so derived ones never collide with
/// them. Collisions get `-2`, `-3`, ... suffixes.
fn derive_anchors(content: &mut [ContentBlock]) {
    let mut taken: HashSet<String> = content
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Heading {
                anchor: Some(a), ..
            } => Some(a.clone()),
            _ => None,
        })
        .collect();

    for block in content.iter_mut() {
        if let ContentBlock::Heading { text, anchor, .. } = block {
            if anchor.is_some() {
                continue;
            }
            let Some(base) = TopicId::slugify(text).map(TopicId::into_inner) else {
                continue;
            };
            let mut candidate = base.clone();
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{base}-{n}");
                n += 1;
            }
            taken.insert(candidate.clone());
            *anchor = Some(candidate);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use topics_core::{AlertVariant, Difficulty, HeadingLevel, ListStyle};

    fn text() -> impl Strategy<Value = String> {
        "[ a-zA-Z\t\n.,]{0,24}"
    }

    fn block() -> impl Strategy<Value = ContentBlock> {
        prop_oneof![
            (1u8..=3, text(), proptest::option::of("[a-z-]{1,8}")).prop_map(|(l, t, a)| {
                ContentBlock::Heading {
                    level: HeadingLevel::new(l).unwrap(),
                    text: t,
                    anchor: a,
                }
            }),
            text().prop_map(|text| ContentBlock::Paragraph { text }),
            (
                prop::sample::select(ListStyle::all().to_vec()),
                prop::collection::vec(text(), 0..4)
            )
                .prop_map(|(style, items)| ContentBlock::List { style, items }),
            (
                prop::collection::vec(text(), 0..3),
                prop::collection::vec(prop::collection::vec(text(), 0..4), 0..3)
            )
                .prop_map(|(headers, rows)| ContentBlock::Table { headers, rows }),
            (text(), text()).prop_map(|(language, code)| ContentBlock::Code { language, code }),
            (prop::sample::select(AlertVariant::all().to_vec()), text())
                .prop_map(|(variant, content)| ContentBlock::Alert { variant, content }),
        ]
    }

    fn topic() -> impl Strategy<Value = TopicModule> {
        (
            text(),
            prop::collection::vec(text(), 0..5),
            prop::collection::vec(block(), 0..8),
        )
            .prop_map(|(title, keywords, content)| TopicModule {
                meta: TopicMeta {
                    id: None,
                    title,
                    description: "d".into(),
                    category: "c".into(),
                    subcategory: None,
                    difficulty: Difficulty::Beginner,
                    duration: None,
                    keywords,
                    prerequisites: BTreeSet::new(),
                    created: None,
                    updated: None,
                },
                content,
                summary: None,
                next_steps: Vec::new(),
            })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(m in topic(), derive in any::<bool>()) {
            let normalizer = Normalizer::new(NormalizeOptions {
                collapse_whitespace: true,
                derive_anchors: derive,
            });
            let once = normalizer.normalize(m);
            let twice = normalizer.normalize(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalize_preserves_block_count_and_order(m in topic()) {
            let kinds: Vec<_> = m.content.iter().map(ContentBlock::kind).collect();
            let n = normalize(m);
            let after: Vec<_> = n.content.iter().map(ContentBlock::kind).collect();
            prop_assert_eq!(kinds, after);
        }

        #[test]
        fn normalized_list_styles_are_canonical(m in topic()) {
            let n = normalize(m);
            for block in &n.content {
                if let ContentBlock::List { style, .. } = block {
                    prop_assert!(style.is_canonical());
                }
            }
        }
    }
}
