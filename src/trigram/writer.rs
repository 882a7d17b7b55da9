//! On-disk trigram index writer.
//!
//! Write-once: `create` → any number of `add` calls → `flush`. Accumulates
//! postings in memory keyed by trigram value, bounded per-file by size and
//! distinct trigram count. Posting lists are not spilled to temporary files
//! and merged on flush; a single archive's worth of files is assumed to
//! fit in memory.

use crate::error::{TrigramError, TrigramResult};
use crate::types::{FileId, Trigram};
use ahash::AHashSet;
use roaring::RoaringBitmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// A file larger than this is rejected outright.
pub const MAX_FILE_LEN: u64 = 1 << 30;

/// A file contributing more distinct trigrams than this is rejected.
pub const MAX_TEXT_TRIGRAMS: usize = 30_000;

const MAGIC: &[u8; 4] = b"GRP1";
const TRAILER_MAGIC: &[u8; 4] = b"GRPT";
const FILE_NAME: &str = "postings.dat";

/// Streaming writer for one trigram index.
pub struct TrigramWriter {
    dir: PathBuf,
    names: Vec<String>,
    postings: BTreeMap<Trigram, RoaringBitmap>,
    bytes_written: u64,
    sealed: bool,
}

impl TrigramWriter {
    /// Initializes an empty index under `dir`, creating it if necessary.
    pub fn create(dir: impl AsRef<Path>) -> TrigramResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            names: Vec::new(),
            postings: BTreeMap::new(),
            bytes_written: 0,
            sealed: false,
        })
    }

    /// Streams one file into the index: assigns the next dense file ID,
    /// records its name, and scans its bytes for distinct trigrams.
    ///
    /// Returns the assigned [`FileId`] on success, or a [`TrigramError`]
    /// if the file is rejected (too long, too many distinct trigrams).
    /// A rejection does not consume a file ID.
    pub fn add<R: Read>(&mut self, name: &str, mut reader: R) -> TrigramResult<FileId> {
        if self.sealed {
            return Err(TrigramError::AlreadyFlushed);
        }

        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        if content.len() as u64 > MAX_FILE_LEN {
            return Err(TrigramError::FileTooLong {
                size: content.len() as u64,
                max: MAX_FILE_LEN,
            });
        }

        let mut distinct: AHashSet<Trigram> = AHashSet::default();
        for t in Trigram::from_bytes(&content) {
            distinct.insert(t);
        }
        if distinct.len() > MAX_TEXT_TRIGRAMS {
            return Err(TrigramError::TooManyTrigrams {
                count: distinct.len(),
                max: MAX_TEXT_TRIGRAMS,
            });
        }

        let file_id = FileId::new(self.names.len() as u32);
        self.names.push(name.to_string());
        for t in distinct {
            self.postings.entry(t).or_default().insert(file_id.as_u32());
        }
        self.bytes_written += content.len() as u64;
        Ok(file_id)
    }

    /// Number of files successfully added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Emits the on-disk format and seals the writer.
    ///
    /// Layout: magic, name table (file-id order), posting table (trigram
    /// ascending, file IDs ascending within each posting), trailer with
    /// section offsets and a trailer magic for integrity checking.
    pub fn flush(self) -> TrigramResult<()> {
        let path = self.dir.join(FILE_NAME);
        let file = File::create(&path)?;
        let mut w = BufWriter::with_capacity(256 << 10, file);

        w.write_all(MAGIC)?;

        let name_table_offset = MAGIC.len() as u64;
        w.write_all(&(self.names.len() as u32).to_le_bytes())?;
        for name in &self.names {
            let bytes = name.as_bytes();
            w.write_all(&(bytes.len() as u32).to_le_bytes())?;
            w.write_all(bytes)?;
        }

        let posting_table_offset = name_table_end_offset(name_table_offset, &self.names);
        w.write_all(&(self.postings.len() as u32).to_le_bytes())?;
        for (trigram, ids) in &self.postings {
            w.write_all(trigram.as_bytes())?;
            w.write_all(&(ids.len() as u32).to_le_bytes())?;
            for id in ids {
                w.write_all(&id.to_le_bytes())?;
            }
        }

        w.write_all(&name_table_offset.to_le_bytes())?;
        w.write_all(&posting_table_offset.to_le_bytes())?;
        w.write_all(TRAILER_MAGIC)?;
        w.flush()?;
        Ok(())
    }
}

/// Computes the byte offset one past the end of the name table, i.e.
/// where the posting table begins, without needing a seekable handle.
fn name_table_end_offset(name_table_offset: u64, names: &[String]) -> u64 {
    let mut len = name_table_offset + 4; // name count prefix
    for name in names {
        len += 4 + name.len() as u64;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn assigns_dense_ids_in_add_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = TrigramWriter::create(dir.path()).unwrap();
        let id0 = w.add("a.txt", Cursor::new(b"hello")).unwrap();
        let id1 = w.add("b.txt", Cursor::new(b"world")).unwrap();
        assert_eq!(id0, FileId::new(0));
        assert_eq!(id1, FileId::new(1));
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn too_many_trigrams_is_rejected_without_consuming_an_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = TrigramWriter::create(dir.path()).unwrap();
        // Build content with more than MAX_TEXT_TRIGRAMS distinct trigrams.
        let mut content = Vec::new();
        for i in 0..(MAX_TEXT_TRIGRAMS + 10) {
            content.extend_from_slice(format!("{i:06}").as_bytes());
        }
        let err = w.add("huge.txt", Cursor::new(content)).unwrap_err();
        assert_eq!(err.code(), "TOO_MANY_TRIGRAMS");
        assert_eq!(w.len(), 0);
    }

    #[test]
    fn flush_seals_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = TrigramWriter::create(dir.path()).unwrap();
        w.add("a.txt", Cursor::new(b"hello world")).unwrap();
        w.flush().unwrap();
        assert!(dir.path().join(FILE_NAME).exists());
    }
}
