//! # topics-core — Foundational Types for Topic Modules
//!
//! Defines the typed shape of an educational topic module and the primitives
//! every other crate in the workspace builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`ContentBlock` is a closed sum type.** One variant per `type`
//!    discriminant (`heading`, `paragraph`, `list`, `table`, `code`, `alert`).
//!    Adding a block kind forces every `match` in the workspace to handle it.
//!
//! 2. **Source spellings survive parsing.** `ListStyle` keeps all four
//!    spellings seen in authored content (`unordered`, `disc`, `ordered`,
//!    `number`); canonicalization is a separate, explicit step.
//!
//! 3. **`TopicId` newtype.** No bare strings for topic identifiers. Slugs
//!    derived from titles go through [`TopicId::slugify`].
//!
//! 4. **`CanonicalBytes` for every digest.** Content digests are computed only
//!    over JCS-canonical bytes, so raw key order never changes a digest.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `topics-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public model types derive `Debug`, `Clone`, `Serialize`, `Deserialize`.

pub mod block;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod topic;

pub use block::{AlertVariant, ContentBlock, HeadingLevel, ListStyle};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::CanonicalizationError;
pub use identity::TopicId;
pub use temporal::parse_topic_date;
pub use topic::{Difficulty, NextStep, Summary, TopicMeta, TopicModule};
