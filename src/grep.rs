//! Line grepper: scans a single file's bytes for regex matches, delivering
//! each matching line with bounded leading/trailing context to a visitor.
//!
//! Built on `grep-regex`/`grep-matcher` for the actual matching, scoped to
//! a single file's context window rather than a whole-tree walk. The
//! visitor is a small trait rather than a bare closure so its mutable
//! state (counters, collected matches) stays explicit at the call site.

use crate::error::Result;
use grep_matcher::Matcher;
use grep_regex::RegexMatcher;
use std::io::{BufRead, BufReader, Read};

/// One matching line plus its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// 1-based line number within the file.
    pub line_number: u64,
    pub line: String,
    /// Up to `context` lines immediately before, in file order.
    pub before: Vec<String>,
    /// Up to `context` lines immediately after, in file order.
    pub after: Vec<String>,
}

/// Whether the grepper should keep scanning this file after a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receives matches as the grepper finds them.
pub trait MatchVisitor {
    fn visit(&mut self, record: MatchRecord) -> Result<Flow>;
}

/// Scans `reader` as a sequence of LF-delimited lines, calling
/// `visitor.visit` for each line `matcher` matches, with up to `context`
/// lines of leading and trailing context (clipped at file boundaries).
///
/// Stops early if the visitor returns [`Flow::Stop`] or an error.
pub fn grep<R: Read>(
    reader: R,
    matcher: &RegexMatcher,
    context: usize,
    visitor: &mut dyn MatchVisitor,
) -> Result<()> {
    let lines: Vec<String> = BufReader::new(reader).lines().collect::<std::io::Result<_>>()?;

    for (idx, line) in lines.iter().enumerate() {
        // A matcher error (e.g. a byte sequence the engine can't classify)
        // is treated as "no match" rather than aborting the whole file.
        let is_match = matcher.is_match(line.as_bytes()).unwrap_or(false);
        if !is_match {
            continue;
        }

        let before_start = idx.saturating_sub(context);
        let after_end = (idx + 1 + context).min(lines.len());
        let record = MatchRecord {
            line_number: (idx + 1) as u64,
            line: line.clone(),
            before: lines[before_start..idx].to_vec(),
            after: lines[idx + 1..after_end].to_vec(),
        };

        if let Flow::Stop = visitor.visit(record)? {
            break;
        }
    }
    Ok(())
}
