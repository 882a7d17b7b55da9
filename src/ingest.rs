//! Ingestion pipeline: walks a zip archive's entries, applies the
//! dot-file / special-file / mode / text-gate filters, and streams
//! surviving entries into both the gzip raw store and the trigram writer.

use crate::error::Result;
use crate::textgate;
use crate::trigram::TrigramWriter;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::ZipArchive;

/// Build-time policy knobs.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub exclude_dot_files: bool,
    /// Archive entry names (directories included) to skip outright.
    pub special_files: HashSet<String>,
}

/// One entry logged to `excluded_files.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedFile {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Reason")]
    pub reason: &'static str,
}

pub const REASON_DOT_FILE: &str = "Dot files are excluded.";
pub const REASON_INVALID_MODE: &str = "Invalid file mode.";
pub const REASON_NOT_TEXT: &str = "Not a text file.";
pub const REASON_BINARY: &str = "Binary files are excluded.";

/// Aggregated file statistics for one build: the minimal summary
/// `build_from_zip` needs to return to its caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub files_indexed: usize,
    pub files_excluded: usize,
    pub bytes_indexed: u64,
}

pub struct IngestResult {
    pub stats: IngestStats,
    pub excluded: Vec<ExcludedFile>,
}

/// Runs the pipeline against `archive_bytes`, populating `dst_dir/raw`,
/// `dst_dir/tri`, and `dst_dir/excluded_files.json`. Does not write the
/// manifest — that's the caller's job.
pub fn ingest(opts: &IndexOptions, archive_bytes: &[u8], dst_dir: &Path) -> Result<IngestResult> {
    let raw_dir = dst_dir.join("raw");
    std::fs::create_dir_all(&raw_dir)?;
    let tri_dir = dst_dir.join("tri");
    let mut writer = TrigramWriter::create(&tri_dir)?;

    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut excluded = Vec::new();
    let mut stats = IngestStats::default();
    let mut skipped_subtrees: Vec<String> = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if under_skipped_subtree(&name, &skipped_subtrees) {
            continue;
        }

        if opts.special_files.contains(&name) {
            if entry.is_dir() {
                skipped_subtrees.push(subtree_prefix(&name));
            }
            continue;
        }

        if opts.exclude_dot_files && name.as_bytes().first() == Some(&b'.') {
            excluded.push(ExcludedFile {
                filename: name.clone(),
                reason: REASON_DOT_FILE,
            });
            stats.files_excluded += 1;
            if entry.is_dir() {
                skipped_subtrees.push(subtree_prefix(&name));
            }
            continue;
        }

        if entry.is_dir() {
            std::fs::create_dir_all(raw_dir.join(&name))?;
            continue;
        }

        if let Some(mode) = entry.unix_mode() {
            const S_IFMT: u32 = 0o170_000;
            const S_IFREG: u32 = 0o100_000;
            if mode & S_IFMT != 0 && mode & S_IFMT != S_IFREG {
                excluded.push(ExcludedFile {
                    filename: name.clone(),
                    reason: REASON_INVALID_MODE,
                });
                stats.files_excluded += 1;
                continue;
            }
        }

        let entry_size = entry.size();
        let mut prefix = vec![0u8; textgate::PREFIX_LEN];
        let n = read_up_to(&mut entry, &mut prefix)?;
        prefix.truncate(n);
        let complete = (n as u64) >= entry_size;
        if !textgate::is_text_prefix(&prefix, complete) {
            excluded.push(ExcludedFile {
                filename: name.clone(),
                reason: REASON_NOT_TEXT,
            });
            stats.files_excluded += 1;
            continue;
        }

        let mut content = prefix;
        entry.read_to_end(&mut content)?;

        let raw_path = raw_dir.join(&name);
        if let Some(parent) = raw_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw_file = std::fs::File::create(&raw_path)?;
        let mut gz = GzEncoder::new(raw_file, Compression::default());
        gz.write_all(&content)?;
        gz.finish()?;

        match writer.add(&name, Cursor::new(&content)) {
            Ok(_) => {
                stats.files_indexed += 1;
                stats.bytes_indexed += content.len() as u64;
            }
            Err(e) => {
                tracing::debug!(file = %name, error = %e, "trigram writer rejected file");
                excluded.push(ExcludedFile {
                    filename: name.clone(),
                    reason: REASON_BINARY,
                });
                stats.files_excluded += 1;
                std::fs::remove_file(&raw_path).ok();
            }
        }
    }

    writer.flush()?;

    let excluded_path = dst_dir.join("excluded_files.json");
    std::fs::write(excluded_path, serde_json::to_vec_pretty(&excluded)?)?;

    Ok(IngestResult { stats, excluded })
}

fn subtree_prefix(name: &str) -> String {
    if name.ends_with('/') {
        name.to_string()
    } else {
        format!("{name}/")
    }
}

fn under_skipped_subtree(name: &str, subtrees: &[String]) -> bool {
    subtrees.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

fn read_up_to<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match r.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}
