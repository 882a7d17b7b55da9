//! On-disk trigram index reader.
//!
//! Opens the file `TrigramWriter::flush` produced and materializes it into
//! in-memory lookup structures: a name table and a trigram → posting-list
//! map. For archive-scale indexes this is cheap and keeps `PostingQuery`
//! trivial; a future incremental-update design (out of scope here) would
//! want lazier, mmap-backed random access instead.

use crate::trigram::query::PostingSource;
use crate::types::{FileId, Trigram};
use memmap2::Mmap;
use roaring::RoaringBitmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

const MAGIC: &[u8; 4] = b"GRP1";
const TRAILER_MAGIC: &[u8; 4] = b"GRPT";
const TRAILER_LEN: usize = 8 + 8 + 4;
const FILE_NAME: &str = "postings.dat";

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("trigram index file is truncated or corrupt")]
    Corrupt,
    #[error("trigram index has an unrecognized magic header")]
    BadMagic,
}

/// A read-only, in-memory view of a flushed trigram index.
pub struct TrigramReader {
    names: Vec<String>,
    postings: BTreeMap<Trigram, RoaringBitmap>,
    all_ids: RoaringBitmap,
}

impl TrigramReader {
    /// Opens and fully parses the index stored under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = dir.as_ref().join(FILE_NAME);
        let file = File::open(path)?;
        // SAFETY: the file is write-once and not mutated concurrently with
        // this read (the crate's reader/writer lock, see `artifact.rs`,
        // guarantees no writer is active while a reader is open).
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse(&mmap)
    }

    fn parse(buf: &[u8]) -> Result<Self, ReaderError> {
        if buf.len() < MAGIC.len() + TRAILER_LEN {
            return Err(ReaderError::Corrupt);
        }
        if &buf[..MAGIC.len()] != MAGIC {
            return Err(ReaderError::BadMagic);
        }
        let trailer = &buf[buf.len() - TRAILER_LEN..];
        if &trailer[16..20] != TRAILER_MAGIC {
            return Err(ReaderError::Corrupt);
        }

        let mut pos = MAGIC.len();
        let name_count = read_u32(buf, &mut pos)?;
        let mut names = Vec::with_capacity(name_count as usize);
        for _ in 0..name_count {
            let len = read_u32(buf, &mut pos)? as usize;
            let bytes = read_bytes(buf, &mut pos, len)?;
            names.push(String::from_utf8_lossy(bytes).into_owned());
        }

        let posting_count = read_u32(buf, &mut pos)?;
        let mut postings = BTreeMap::new();
        let mut all_ids = RoaringBitmap::new();
        for _ in 0..posting_count {
            let trigram_bytes = read_bytes(buf, &mut pos, 3)?;
            let trigram = Trigram::new([trigram_bytes[0], trigram_bytes[1], trigram_bytes[2]]);
            let file_count = read_u32(buf, &mut pos)?;
            let mut ids = RoaringBitmap::new();
            for _ in 0..file_count {
                let id = read_u32(buf, &mut pos)?;
                ids.insert(id);
                all_ids.insert(id);
            }
            postings.insert(trigram, ids);
        }

        Ok(Self {
            names,
            postings,
            all_ids,
        })
    }

    /// Returns the recorded path for a file ID, if it exists.
    #[must_use]
    pub fn name(&self, id: FileId) -> Option<&str> {
        self.names.get(id.as_u32() as usize).map(String::as_str)
    }

    /// Number of distinct files in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl PostingSource for TrigramReader {
    fn posting(&self, trigram: Trigram) -> RoaringBitmap {
        self.postings.get(&trigram).cloned().unwrap_or_default()
    }

    fn all_file_ids(&self) -> RoaringBitmap {
        self.all_ids.clone()
    }
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32, ReaderError> {
    let bytes = read_bytes(buf, pos, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_bytes<'a>(buf: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8], ReaderError> {
    let end = pos.checked_add(len).ok_or(ReaderError::Corrupt)?;
    if end > buf.len() {
        return Err(ReaderError::Corrupt);
    }
    let slice = &buf[*pos..end];
    *pos = end;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigram::query::{eval, TrigramQuery};
    use crate::trigram::writer::TrigramWriter;
    use std::io::Cursor;

    #[test]
    fn round_trips_names_and_postings() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = TrigramWriter::create(dir.path()).unwrap();
        w.add("a.txt", Cursor::new(b"hello world")).unwrap();
        w.add("b.txt", Cursor::new(b"goodbye world")).unwrap();
        w.flush().unwrap();

        let r = TrigramReader::open(dir.path()).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.name(FileId::new(0)), Some("a.txt"));
        assert_eq!(r.name(FileId::new(1)), Some("b.txt"));

        let q = TrigramQuery::Trigram(Trigram::new(*b"wor"));
        let result = eval(&q, &r);
        assert!(result.contains(0));
        assert!(result.contains(1));

        let q = TrigramQuery::Trigram(Trigram::new(*b"hel"));
        let result = eval(&q, &r);
        assert!(result.contains(0));
        assert!(!result.contains(1));
    }

    #[test]
    fn any_returns_every_file_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = TrigramWriter::create(dir.path()).unwrap();
        w.add("a.txt", Cursor::new(b"xyz")).unwrap();
        w.flush().unwrap();

        let r = TrigramReader::open(dir.path()).unwrap();
        let result = eval(&TrigramQuery::Any, &r);
        assert_eq!(result, RoaringBitmap::from_iter([0]));
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), b"not an index").unwrap();
        let err = TrigramReader::open(dir.path()).unwrap_err();
        assert!(matches!(err, ReaderError::BadMagic));
    }
}
