//! Search driver: plans a trigram query for the pattern, evaluates it
//! against the open index to get candidate file IDs, then greps each
//! candidate's decompressed raw content for actual matches.
//!
//! Offset/limit paginate over *files with at least one match*, not over
//! individual matches; the match cap (`MATCH_LIMIT`) is a separate, hard
//! ceiling on total matches returned across the whole response. Every
//! candidate is still opened and grepped regardless of where it falls
//! relative to offset/limit, so `files_with_match`/`files_opened` count
//! the full candidate set; only which files' `Match` records get
//! collected is affected by pagination.

use crate::artifact::Index;
use crate::error::{Error, Result};
use crate::grep::{self, Flow, MatchRecord, MatchVisitor};
use crate::planner;
use crate::trigram::eval;
use crate::types::FileId;
use flate2::read::GzDecoder;
use grep_regex::RegexMatcherBuilder;
use serde::Serialize;
use std::io::Read as _;
use std::path::Path;
use std::time::{Duration, Instant};

/// Hard cap on the total number of matches a single search may return
/// before aborting with [`Error::LimitExceeded`].
pub const MATCH_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub ignore_case: bool,
    pub lines_of_context: usize,
    pub file_regexp: Option<String>,
    /// Accepted but inert: this crate does no syntax or comment-aware
    /// filtering.
    pub ignore_comments: bool,
    pub offset: usize,
    /// Maximum files-with-match to return; `0` means unbounded.
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            ignore_case: false,
            lines_of_context: 0,
            file_regexp: None,
            ignore_comments: false,
            offset: 0,
            limit: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub file: String,
    pub line_number: u64,
    pub line: String,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub matches: Vec<SearchMatch>,
    pub files_with_match: usize,
    pub files_opened: usize,
    pub duration: Duration,
    pub slug: String,
    /// Always 1: this crate has no incremental updates, so every built
    /// index is its own single, immutable revision.
    pub revision: u64,
}

struct Collector<'a> {
    file: &'a str,
    out: &'a mut Vec<SearchMatch>,
}

impl<'a> MatchVisitor for Collector<'a> {
    fn visit(&mut self, record: MatchRecord) -> Result<Flow> {
        self.out.push(SearchMatch {
            file: self.file.to_string(),
            line_number: record.line_number,
            line: record.line,
            before: record.before,
            after: record.after,
        });
        Ok(Flow::Continue)
    }
}

/// Runs one search against an open index.
pub fn search(index: &Index, pattern: &str, opts: &SearchOptions) -> Result<SearchResponse> {
    let start = Instant::now();

    let matcher = RegexMatcherBuilder::new()
        .case_insensitive(opts.ignore_case)
        .multi_line(true)
        .build(pattern)
        .map_err(|e| Error::PatternInvalid(e.to_string()))?;

    let file_matcher = match &opts.file_regexp {
        Some(p) => Some(
            regex::RegexBuilder::new(p)
                .case_insensitive(opts.ignore_case)
                .build()
                .map_err(|e| Error::PatternInvalid(e.to_string()))?,
        ),
        None => None,
    };

    let query = planner::plan_pattern(pattern, opts.ignore_case);

    index.with_reader(|reader| {
        let candidates = eval(&query, reader);

        let mut matches = Vec::new();
        let mut files_found = 0usize;
        let mut files_collected = 0usize;
        let mut files_opened = 0usize;

        for id in &candidates {
            let name = match reader.name(FileId::new(id)) {
                Some(n) => n,
                None => continue,
            };
            if let Some(fm) = &file_matcher {
                if !fm.is_match(name) {
                    continue;
                }
            }

            let raw_path = index.dir().join("raw").join(name);
            let content = match read_raw(&raw_path) {
                Ok(c) => c,
                Err(_) => continue,
            };
            files_opened += 1;

            let mut file_matches = Vec::new();
            {
                let mut collector = Collector {
                    file: name,
                    out: &mut file_matches,
                };
                grep::grep(
                    content.as_slice(),
                    &matcher,
                    opts.lines_of_context,
                    &mut collector,
                )?;
            }

            if file_matches.is_empty() {
                continue;
            }
            files_found += 1;

            if files_found <= opts.offset {
                continue;
            }
            if opts.limit != 0 && files_collected >= opts.limit {
                continue;
            }

            files_collected += 1;
            matches.extend(file_matches);
            if matches.len() > MATCH_LIMIT {
                return Err(Error::LimitExceeded { limit: MATCH_LIMIT });
            }
        }

        Ok(SearchResponse {
            matches,
            files_with_match: files_found,
            files_opened,
            duration: start.elapsed(),
            slug: index.slug().to_string(),
            revision: 1,
        })
    })
}

fn read_raw(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = std::fs::File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}
