//! Regex → trigram query planner.
//!
//! Compiles a regex's syntax tree into a conservative [`TrigramQuery`]:
//! one that never excludes a file whose content actually matches the
//! regex, trading precision for that soundness guarantee whenever the
//! tree isn't reducible to concrete byte runs.
//!
//! Case folding is handled upstream: [`plan_pattern`] parses the pattern
//! with `regex-syntax`'s own `case_insensitive` option, so a literal like
//! `"Go"` already arrives here as a class-per-letter HIR (`{G,g}{o,O}`)
//! when the caller asked for case-insensitive search. The planner just
//! needs to recognize small classes as constrained byte positions, not
//! fold case itself.

use crate::types::Trigram;
use crate::trigram::TrigramQuery;
use regex_syntax::hir::{Class, Hir, HirKind};
use regex_syntax::ParserBuilder;

/// A class with more than this many representable single bytes is treated
/// as unconstrained — past this point the Cartesian product of window
/// combinations stops being worth tracking.
const SMALL_CLASS_MAX: usize = 4;

/// Parses `pattern` (with the same multiline/case flags the search driver
/// always applies) and plans a conservative trigram query.
///
/// A parse failure here does not abort the search: it degrades to
/// [`TrigramQuery::Any`], which still yields a sound (if unpruned) result.
/// The actual match compilation (and therefore pattern-validity errors
/// surfaced to the caller) happens separately against `regex`/`grep-regex`.
#[must_use]
pub fn plan_pattern(pattern: &str, ignore_case: bool) -> TrigramQuery {
    let parsed = ParserBuilder::new()
        .case_insensitive(ignore_case)
        .multi_line(true)
        .build()
        .parse(pattern);
    match parsed {
        Ok(hir) => plan(&hir),
        Err(_) => TrigramQuery::Any,
    }
}

/// Plans a trigram query from an already-parsed syntax tree.
#[must_use]
pub fn plan(hir: &Hir) -> TrigramQuery {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => TrigramQuery::Any,
        HirKind::Literal(lit) => windows_to_query(&literal_positions(&lit.0)),
        HirKind::Class(class) => match small_byte_positions(class) {
            Some(bytes) => windows_to_query(&[Some(bytes)]),
            None => TrigramQuery::Any,
        },
        HirKind::Repetition(rep) => {
            if rep.min == 0 {
                TrigramQuery::Any
            } else {
                plan(&rep.sub)
            }
        }
        HirKind::Capture(cap) => plan(&cap.sub),
        HirKind::Concat(children) => {
            let mut positions = Vec::new();
            let mut extra = Vec::new();
            for child in children {
                flatten(child, &mut positions, &mut extra);
            }
            extra.push(windows_to_query(&positions));
            TrigramQuery::and(extra)
        }
        HirKind::Alternation(children) => TrigramQuery::or(children.iter().map(plan)),
    }
}

/// Flattens a concatenation child into a run of byte-position constraints
/// where possible (literal bytes, small classes), or falls back to
/// `plan`-ing it as an opaque AND-ed constraint otherwise (breaking the
/// contiguous run, since a gap can't contribute to a straddling window).
fn flatten(hir: &Hir, positions: &mut Vec<Option<Vec<u8>>>, extra: &mut Vec<TrigramQuery>) {
    match hir.kind() {
        HirKind::Literal(lit) => positions.extend(literal_positions(&lit.0)),
        HirKind::Class(class) => match small_byte_positions(class) {
            Some(bytes) => positions.push(Some(bytes)),
            None => {
                positions.push(None);
                extra.push(TrigramQuery::Any);
            }
        },
        HirKind::Concat(children) => {
            for child in children {
                flatten(child, positions, extra);
            }
        }
        HirKind::Capture(cap) => flatten(&cap.sub, positions, extra),
        _ => {
            positions.push(None);
            extra.push(plan(hir));
        }
    }
}

fn literal_positions(bytes: &[u8]) -> Vec<Option<Vec<u8>>> {
    bytes.iter().map(|&b| Some(vec![b])).collect()
}

fn small_byte_positions(class: &Class) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    match class {
        Class::Unicode(u) => {
            for r in u.ranges() {
                let start = r.start() as u32;
                let end = r.end() as u32;
                if end > 0x7F {
                    return None;
                }
                for c in start..=end {
                    bytes.push(c as u8);
                    if bytes.len() > SMALL_CLASS_MAX {
                        return None;
                    }
                }
            }
        }
        Class::Bytes(b) => {
            for r in b.ranges() {
                for c in r.start()..=r.end() {
                    bytes.push(c);
                    if bytes.len() > SMALL_CLASS_MAX {
                        return None;
                    }
                }
            }
        }
    }
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

/// Slides a window of 3 over a position run, AND-ing together an OR (over
/// the Cartesian product of byte choices) for every fully-constrained
/// window. Windows spanning a gap (a `None` position) are skipped, which
/// is strictly more conservative than tracking boundary trigrams across
/// the gap — still sound, just less selective.
fn windows_to_query(positions: &[Option<Vec<u8>>]) -> TrigramQuery {
    if positions.len() < 3 {
        return TrigramQuery::Any;
    }
    let mut window_queries = Vec::new();
    for w in positions.windows(3) {
        if let [Some(a), Some(b), Some(c)] = w {
            let mut combos = Vec::with_capacity(a.len() * b.len() * c.len());
            for &x in a {
                for &y in b {
                    for &z in c {
                        combos.push(TrigramQuery::Trigram(Trigram::new([x, y, z])));
                    }
                }
            }
            window_queries.push(TrigramQuery::or(combos));
        }
    }
    TrigramQuery::and(window_queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_str(pattern: &str, ignore_case: bool) -> TrigramQuery {
        plan_pattern(pattern, ignore_case)
    }

    #[test]
    fn short_literal_is_any() {
        assert_eq!(plan_str("ab", false), TrigramQuery::Any);
    }

    #[test]
    fn literal_of_three_is_single_trigram() {
        let q = plan_str("cat", false);
        assert_eq!(q, TrigramQuery::Trigram(Trigram::new(*b"cat")));
    }

    #[test]
    fn literal_longer_than_three_ands_windows() {
        let q = plan_str("hello", false);
        match q {
            TrigramQuery::And(children) => assert_eq!(children.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn alternation_is_or() {
        let q = plan_str("cat|dog", false);
        match q {
            TrigramQuery::Or(children) => assert_eq!(children.len(), 2),
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn star_repetition_is_any() {
        assert_eq!(plan_str("ab*", false), TrigramQuery::Any);
    }

    #[test]
    fn plus_repetition_keeps_inner_constraint() {
        let q = plan_str("(cat)+", false);
        assert_ne!(q, TrigramQuery::Any);
    }

    #[test]
    fn wildcard_class_is_any() {
        assert_eq!(plan_str(".", false), TrigramQuery::Any);
    }

    #[test]
    fn case_insensitive_literal_expands_each_byte() {
        let q = plan_str("cat", true);
        // Each of the 3 positions can fold case, but 'a' has no case
        // variant collision issue here — still expect an And of 1 window
        // whose Or covers the 2^3 = 8 case combinations.
        match q {
            TrigramQuery::And(children) if children.len() == 1 => match &children[0] {
                TrigramQuery::Or(combos) => assert_eq!(combos.len(), 8),
                other => panic!("expected Or, got {other:?}"),
            },
            TrigramQuery::Or(combos) => assert_eq!(combos.len(), 8),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn anchors_are_any() {
        assert_eq!(plan_str("^$", false), TrigramQuery::Any);
    }
}
