//! Shared test harness for grip integration tests.

#![allow(dead_code)]

use grip::artifact::{build_from_zip, Index};
use grip::ingest::IndexOptions;
use std::io::{Cursor, Write as _};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Builds an in-memory zip archive from `(name, content)` pairs.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let opts: FileOptions<()> = FileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, opts).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }
    buf.into_inner()
}

/// Builds a zip from `entries`, indexes it into a fresh temp directory
/// with `opts`, and opens the resulting index. Keeps the parent `TempDir`
/// alive alongside the open `Index` so the directory isn't reaped early.
pub fn build_and_open(entries: &[(&str, &[u8])], opts: &IndexOptions) -> (TempDir, Index) {
    let zip = build_zip(entries);
    let parent = TempDir::new().expect("tempdir");
    let dst = parent.path().join("idx");
    build_from_zip(opts, &zip, &dst, "test-slug").expect("build_from_zip");
    let index = Index::open(&dst).expect("open");
    (parent, index)
}
