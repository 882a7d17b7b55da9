//! Index artifact and lifecycle: the on-disk manifest plus the open-handle
//! state machine wrapping a [`TrigramReader`].

use crate::error::{Error, Result};
use crate::ingest::{self, IndexOptions, IngestStats};
use crate::trigram::TrigramReader;
use crate::types::Slug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

const MANIFEST_FILE: &str = "manifest.bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    time: u64,
    slug: String,
}

/// Identifies one built index on disk, independent of whether it's open.
#[derive(Debug, Clone)]
pub struct IndexRef {
    pub time: u64,
    pub slug: Slug,
    pub dir: PathBuf,
}

impl IndexRef {
    fn write_manifest(&self) -> Result<()> {
        let manifest = Manifest {
            time: self.time,
            slug: self.slug.as_str().to_string(),
        };
        let path = self.dir.join(MANIFEST_FILE);
        let file = std::fs::File::create(path)?;
        bincode::serialize_into(file, &manifest).map_err(|source| Error::ManifestCorrupt {
            dir: self.dir.clone(),
            source,
        })
    }

    /// Recursively deletes the index directory. Idempotent: removing an
    /// already-gone directory is not an error.
    pub fn remove(&self) -> Result<()> {
        remove_dir_idempotent(&self.dir)
    }
}

fn remove_dir_idempotent(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Reads the manifest at `dir` without opening the trigram reader.
///
/// A missing or corrupt manifest still yields a best-effort [`IndexRef`]
/// (just the directory, since nothing else decoded) alongside the error,
/// so callers like `grip destroy` can remove a half-built index without a
/// readable manifest.
#[must_use]
pub fn read(dir: impl AsRef<Path>) -> (IndexRef, Result<()>) {
    let dir = dir.as_ref().to_path_buf();
    let placeholder = IndexRef {
        time: 0,
        slug: Slug::new(""),
        dir: dir.clone(),
    };

    let path = dir.join(MANIFEST_FILE);
    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return (placeholder, Err(Error::ManifestMissing { dir }));
        }
        Err(e) => return (placeholder, Err(e.into())),
    };

    let decoded: std::result::Result<Manifest, _> = bincode::deserialize_from(file);
    match decoded {
        Ok(manifest) => (
            IndexRef {
                time: manifest.time,
                slug: Slug::new(manifest.slug),
                dir,
            },
            Ok(()),
        ),
        Err(source) => (placeholder, Err(Error::ManifestCorrupt { dir, source })),
    }
}

/// Builds a new index from zip archive bytes under `dst_dir`: runs the
/// ingestion pipeline, then writes the manifest that makes `dst_dir` a
/// recognized index directory.
pub fn build_from_zip(
    opts: &IndexOptions,
    archive_bytes: &[u8],
    dst_dir: impl AsRef<Path>,
    slug: impl Into<Slug>,
) -> Result<(IndexRef, IngestStats)> {
    let dst_dir = dst_dir.as_ref().to_path_buf();
    std::fs::create_dir_all(&dst_dir)?;
    let result = ingest::ingest(opts, archive_bytes, &dst_dir)?;

    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let index_ref = IndexRef {
        time,
        slug: slug.into(),
        dir: dst_dir,
    };
    index_ref.write_manifest()?;

    Ok((index_ref, result.stats))
}

/// An open index: a live [`TrigramReader`] behind a reader/writer lock,
/// so `close`/`destroy` can take the handle away from a concurrent
/// search without racing it. A poisoned lock is recovered with
/// `unwrap_or_else(|e| e.into_inner())` rather than propagated as a
/// user-facing error, since a panicking reader never corrupts the
/// on-disk index it's reading from.
pub struct Index {
    dir: PathBuf,
    slug: Slug,
    reader: RwLock<Option<TrigramReader>>,
}

impl Index {
    /// Opens the trigram reader for an already-built index directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let (index_ref, manifest_result) = read(&dir);
        manifest_result?;
        let reader = TrigramReader::open(dir.join("tri"))?;
        Ok(Self {
            dir,
            slug: index_ref.slug,
            reader: RwLock::new(Some(reader)),
        })
    }

    #[must_use]
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Runs `f` with the open reader, or [`Error::IndexClosed`] if the
    /// index has already been closed or destroyed.
    pub fn with_reader<T>(&self, f: impl FnOnce(&TrigramReader) -> Result<T>) -> Result<T> {
        let guard = self.reader.read().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(r) => f(r),
            None => Err(Error::IndexClosed),
        }
    }

    /// Drops the open reader, releasing its mmap. Idempotent; the index
    /// directory is left on disk.
    pub fn close(&self) {
        let mut guard = self.reader.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    /// Closes the index, then recursively deletes its directory.
    pub fn destroy(&self) -> Result<()> {
        let mut guard = self.reader.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        drop(guard);
        remove_dir_idempotent(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
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

    #[test]
    fn build_open_search_destroy_round_trip() {
        let zip = build_zip(&[("a.rs", b"fn main() {}\n")]);
        let parent = tempfile::tempdir().unwrap();
        let dst = parent.path().join("idx");

        let (index_ref, stats) =
            build_from_zip(&IndexOptions::default(), &zip, &dst, "my-slug").unwrap();
        assert_eq!(stats.files_indexed, 1);
        assert_eq!(index_ref.slug.as_str(), "my-slug");

        let index = Index::open(&dst).unwrap();
        assert_eq!(index.slug().as_str(), "my-slug");
        index.with_reader(|r| {
            assert_eq!(r.len(), 1);
            Ok(())
        }).unwrap();

        index.close();
        let err = index.with_reader(|_| Ok(())).unwrap_err();
        assert_eq!(err.code(), "INDEX_CLOSED");

        let index = Index::open(&dst).unwrap();
        index.destroy().unwrap();
        assert!(!dst.exists());
    }

    #[test]
    fn read_reports_missing_manifest_but_still_returns_a_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (index_ref, result) = read(dir.path());
        assert_eq!(index_ref.dir, dir.path());
        assert!(matches!(result, Err(Error::ManifestMissing { .. })));
    }

    #[test]
    fn index_ref_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let index_ref = IndexRef {
            time: 0,
            slug: Slug::new("x"),
            dir: dir.path().to_path_buf(),
        };
        index_ref.remove().unwrap();
        index_ref.remove().unwrap();
    }
}
