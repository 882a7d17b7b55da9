//! Boolean trigram-set query expressions and their evaluation.
//!
//! This is the algebra the regex-to-trigram planner (`crate::planner`)
//! compiles into, and that the trigram reader evaluates against its
//! posting lists.

use crate::types::Trigram;
use roaring::RoaringBitmap;

/// A query tree over trigram posting sets.
///
/// `Any` means "no constraint" (every indexed file is a candidate) and is
/// both the identity element for `And` and the absorbing element for `Or`
/// — the smart constructors below fold those simplifications in eagerly
/// so evaluated trees stay small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrigramQuery {
    Any,
    Trigram(Trigram),
    And(Vec<TrigramQuery>),
    Or(Vec<TrigramQuery>),
}

impl TrigramQuery {
    /// Builds an `And` node, dropping `Any` children and flattening nested
    /// `And`s. An empty or all-`Any` input collapses to `Any`.
    #[must_use]
    pub fn and(parts: impl IntoIterator<Item = TrigramQuery>) -> TrigramQuery {
        let mut flat = Vec::new();
        for p in parts {
            match p {
                TrigramQuery::Any => {}
                TrigramQuery::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => TrigramQuery::Any,
            1 => flat.into_iter().next().unwrap(),
            _ => TrigramQuery::And(flat),
        }
    }

    /// Builds an `Or` node, flattening nested `Or`s. Any `Any` child makes
    /// the whole expression `Any` (a disjunct that matches everything
    /// can't be pruned away).
    #[must_use]
    pub fn or(parts: impl IntoIterator<Item = TrigramQuery>) -> TrigramQuery {
        let mut flat = Vec::new();
        for p in parts {
            if matches!(p, TrigramQuery::Any) {
                return TrigramQuery::Any;
            }
            match p {
                TrigramQuery::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => TrigramQuery::Any,
            1 => flat.into_iter().next().unwrap(),
            _ => TrigramQuery::Or(flat),
        }
    }
}

/// Anything that can answer "which file IDs contain this trigram" and
/// "what are all the file IDs" — the trigram reader implements this.
pub trait PostingSource {
    fn posting(&self, trigram: Trigram) -> RoaringBitmap;
    fn all_file_ids(&self) -> RoaringBitmap;
}

/// Evaluates a query tree against a posting source, returning the
/// ascending, duplicate-free set of candidate file IDs.
pub fn eval<S: PostingSource + ?Sized>(query: &TrigramQuery, source: &S) -> RoaringBitmap {
    match query {
        TrigramQuery::Any => source.all_file_ids(),
        TrigramQuery::Trigram(t) => source.posting(*t),
        TrigramQuery::And(children) => {
            let mut children = children.iter();
            let Some(first) = children.next() else {
                return source.all_file_ids();
            };
            let mut acc = eval(first, source);
            for child in children {
                if acc.is_empty() {
                    break;
                }
                acc &= eval(child, source);
            }
            acc
        }
        TrigramQuery::Or(children) => {
            let mut acc = RoaringBitmap::new();
            for child in children {
                acc |= eval(child, source);
            }
            acc
        }
    }
}
