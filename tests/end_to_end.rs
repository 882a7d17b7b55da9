//! End-to-end scenarios, one per entry in the testable-properties list:
//! literal search, case-insensitivity, binary/dot-file exclusion, context
//! windows, the match cap, pagination, and destroy idempotence.

mod common;

use common::{build_and_open, build_zip};
use grip::artifact::{build_from_zip, Index};
use grip::ingest::IndexOptions;
use grip::search::{search, SearchOptions};
use tempfile::TempDir;

#[test]
fn simple_literal_search() {
    let (_tmp, index) = build_and_open(
        &[("a.txt", b"hello world\n"), ("b.txt", b"HELLO\n")],
        &IndexOptions::default(),
    );
    let resp = search(&index, "hello", &SearchOptions::default()).unwrap();
    assert_eq!(resp.files_with_match, 1);
    assert_eq!(resp.files_opened, 1);
    assert_eq!(resp.matches.len(), 1);
    assert_eq!(resp.matches[0].file, "a.txt");
    assert_eq!(resp.matches[0].line, "hello world");
    assert_eq!(resp.matches[0].line_number, 1);
}

#[test]
fn case_insensitive_search() {
    let (_tmp, index) = build_and_open(
        &[("a.txt", b"hello world\n"), ("b.txt", b"HELLO\n")],
        &IndexOptions::default(),
    );
    let opts = SearchOptions {
        ignore_case: true,
        ..Default::default()
    };
    let resp = search(&index, "hello", &opts).unwrap();
    assert_eq!(resp.files_with_match, 2);
}

#[test]
fn binary_exclusion() {
    let (tmp, index) = build_and_open(
        &[("x.pdf", b"%PDF-1.4\n\xFF\xFE\x00binary stream follows")],
        &IndexOptions::default(),
    );
    let log: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(index.dir().join("excluded_files.json")).unwrap())
            .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["Filename"], "x.pdf");
    assert_eq!(log[0]["Reason"], "Not a text file.");
    assert!(!index.dir().join("raw").join("x.pdf").exists());
    drop(tmp);
}

#[test]
fn dot_file_exclusion() {
    let opts = IndexOptions {
        exclude_dot_files: true,
        ..Default::default()
    };
    let (_tmp, index) = build_and_open(&[(".env", b"SECRET=1\n")], &opts);
    let resp = search(&index, "SECRET", &SearchOptions::default()).unwrap();
    assert!(resp.matches.is_empty());

    let log: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(index.dir().join("excluded_files.json")).unwrap())
            .unwrap();
    assert_eq!(log[0]["Reason"], "Dot files are excluded.");
}

#[test]
fn context_window() {
    let (_tmp, index) = build_and_open(
        &[("c.txt", b"A\nB\nC\nD\nE\n")],
        &IndexOptions::default(),
    );
    let opts = SearchOptions {
        lines_of_context: 1,
        ..Default::default()
    };
    let resp = search(&index, "C", &opts).unwrap();
    assert_eq!(resp.matches.len(), 1);
    assert_eq!(resp.matches[0].before, vec!["B".to_string()]);
    assert_eq!(resp.matches[0].after, vec!["D".to_string()]);
}

#[test]
fn match_cap_overflow() {
    let content: String = "x\n".repeat(2000);
    let (_tmp, index) = build_and_open(
        &[("big.txt", content.as_bytes())],
        &IndexOptions::default(),
    );
    let err = search(&index, "x", &SearchOptions::default()).unwrap_err();
    assert_eq!(err.code(), "LIMIT_EXCEEDED");
}

#[test]
fn pagination_over_files_with_match() {
    let (_tmp, index) = build_and_open(
        &[
            ("a.txt", b"needle\n"),
            ("b.txt", b"needle\n"),
            ("c.txt", b"needle\n"),
        ],
        &IndexOptions::default(),
    );
    let opts = SearchOptions {
        offset: 1,
        limit: 1,
        ..Default::default()
    };
    let resp = search(&index, "needle", &opts).unwrap();
    assert_eq!(resp.files_with_match, 3);
    assert_eq!(resp.files_opened, 3);
    assert_eq!(resp.matches.len(), 1);
    assert_eq!(resp.matches[0].file, "b.txt");
}

#[test]
fn open_after_build_round_trips_every_indexed_file() {
    let (_tmp, index) = build_and_open(
        &[
            ("a.rs", b"fn a() {}\n"),
            ("b.rs", b"fn b() {}\n"),
            ("c.rs", b"fn c() {}\n"),
        ],
        &IndexOptions::default(),
    );
    let resp = search(&index, "(?m).", &SearchOptions::default()).unwrap();
    let mut files: Vec<_> = resp.matches.iter().map(|m| m.file.clone()).collect();
    files.sort();
    files.dedup();
    assert_eq!(files, vec!["a.rs", "b.rs", "c.rs"]);
}

#[test]
fn destroy_is_idempotent() {
    let zip = build_zip(&[("a.txt", b"hello\n")]);
    let parent = TempDir::new().unwrap();
    let dst = parent.path().join("idx");
    build_from_zip(&IndexOptions::default(), &zip, &dst, "slug").unwrap();

    let index = Index::open(&dst).unwrap();
    index.destroy().unwrap();
    assert!(!dst.exists());

    let (index_ref, result) = grip::read(&dst);
    assert!(result.is_err());
    index_ref.remove().unwrap();
    index_ref.remove().unwrap();
}

#[test]
fn build_is_deterministic() {
    let zip = build_zip(&[("a.rs", b"fn main() {}\n"), ("b.rs", b"struct S;\n")]);
    let parent = TempDir::new().unwrap();

    let dst_a = parent.path().join("a");
    let (_, stats_a) = build_from_zip(&IndexOptions::default(), &zip, &dst_a, "s").unwrap();
    let dst_b = parent.path().join("b");
    let (_, stats_b) = build_from_zip(&IndexOptions::default(), &zip, &dst_b, "s").unwrap();

    assert_eq!(stats_a.files_indexed, stats_b.files_indexed);
    let postings_a = std::fs::read(dst_a.join("tri").join("postings.dat")).unwrap();
    let postings_b = std::fs::read(dst_b.join("tri").join("postings.dat")).unwrap();
    assert_eq!(postings_a, postings_b);

    let excluded_a = std::fs::read_to_string(dst_a.join("excluded_files.json")).unwrap();
    let excluded_b = std::fs::read_to_string(dst_b.join("excluded_files.json")).unwrap();
    assert_eq!(excluded_a, excluded_b);
}
