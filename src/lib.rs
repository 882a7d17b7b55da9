//! grip: trigram-indexed code search over archived source trees.
//!
//! Given a zip archive, [`artifact::build_from_zip`] ingests its text
//! files into a write-once on-disk index (raw gzip store + trigram
//! postings + exclusion log + manifest). [`artifact::Index::open`] loads
//! that index back, and [`search::search`] answers substring/regex
//! queries against it by planning a trigram query, intersecting posting
//! lists, and grepping only the surviving candidate files.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 zip archive                   │
//! └─────────────────────┬──────────────────────────┘
//!                        │ ingest::ingest
//!          ┌─────────────┼──────────────┐
//!          │             │              │
//!     ┌────▼────┐   ┌────▼─────┐  ┌─────▼──────┐
//!     │ textgate│   │ raw/*.gz │  │ tri postings│
//!     │ (filter)│   │ (gzip)   │  │ (trigram.rs)│
//!     └─────────┘   └──────────┘  └──────┬──────┘
//!                                        │
//!                   search::search ◄─────┘
//!                        │
//!              planner::plan_pattern
//!                        │
//!                   grep::grep (per candidate file)
//! ```
//!
//! This crate does not do incremental index updates, cross-index
//! federation, relevance ranking, natural-language tokenization, or
//! syntax-aware filtering — see the module docs for specifics.

pub mod artifact;
pub mod error;
pub mod grep;
pub mod ingest;
pub mod planner;
pub mod search;
pub mod textgate;
pub mod trigram;
pub mod types;

pub use artifact::{build_from_zip, Index, IndexRef};
pub use error::{Error, Result};
pub use search::{search as run_search, SearchOptions, SearchResponse};
pub use types::{FileId, Slug, Trigram};

use std::path::Path;

/// Opens an existing index directory. Alias for [`Index::open`] matching
/// the operation name callers look for.
pub fn open(dir: impl AsRef<Path>) -> Result<Index> {
    Index::open(dir)
}

/// Reads the manifest at an index directory without opening it. Alias
/// for [`artifact::read`].
#[must_use]
pub fn read(dir: impl AsRef<Path>) -> (IndexRef, Result<()>) {
    artifact::read(dir)
}
