//! Type-safe newtypes shared across the index and search pipeline.
//!
//! These newtypes provide compile-time safety and semantic clarity
//! for core domain concepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense file identifier assigned during ingestion, in archive order.
///
/// Using u32 supports ~4 billion files per index, far beyond any archive
/// this system is expected to handle. The newtype prevents accidental
/// mixing with other integer values (trigram values, line numbers, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl FileId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.0;
        write!(f, "file:{id}")
    }
}

impl From<u32> for FileId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<FileId> for u32 {
    fn from(id: FileId) -> Self {
        id.0
    }
}

/// Opaque caller-assigned identifier for an indexed archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(pub String);

impl Slug {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Slug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Slug {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Three-byte trigram, the indexing unit for substring search.
///
/// Trigrams enable fast substring search by decomposing strings
/// into overlapping 3-byte sequences. For example:
/// "auth" → ["aut", "uth"]
///
/// Finding files containing "auth" means finding files that
/// contain ALL of its trigrams.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Trigram(pub [u8; 3]);

impl Trigram {
    #[must_use]
    pub const fn new(bytes: [u8; 3]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    /// Packs the trigram into a 24-bit value for compact on-disk storage.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        let [a, b, c] = self.0;
        (a as u32) << 16 | (b as u32) << 8 | (c as u32)
    }

    /// Unpacks a 24-bit value produced by [`Trigram::to_u32`].
    #[must_use]
    pub const fn from_u32(v: u32) -> Self {
        Self([
            ((v >> 16) & 0xff) as u8,
            ((v >> 8) & 0xff) as u8,
            (v & 0xff) as u8,
        ])
    }

    /// Extracts all trigrams from a string, in order, with duplicates.
    ///
    /// Short strings (< 3 bytes) yield no trigrams.
    pub fn extract(s: &str) -> impl Iterator<Item = Trigram> + '_ {
        Self::from_bytes(s.as_bytes())
    }

    /// Extracts trigrams from raw bytes, in order, with duplicates.
    pub fn from_bytes(bytes: &[u8]) -> impl Iterator<Item = Trigram> + '_ {
        bytes.windows(3).map(|w| Trigram([w[0], w[1], w[2]]))
    }
}

impl fmt::Debug for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Try to display as UTF-8 string if valid
        if let Ok(s) = std::str::from_utf8(&self.0) {
            write!(f, "Trigram({s:?})")
        } else {
            let [a, b, c] = self.0;
            write!(f, "Trigram({a:02x}{b:02x}{c:02x})")
        }
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(s) = std::str::from_utf8(&self.0) {
            write!(f, "{s}")
        } else {
            let [a, b, c] = self.0;
            write!(f, "{a:02x}{b:02x}{c:02x}")
        }
    }
}

// Compile-time assertions for thread safety.
// These ensure Send+Sync remain implemented and catch regressions.
#[cfg(test)]
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<FileId>();
    assert_send_sync::<Slug>();
    assert_send_sync::<Trigram>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigram_extraction() {
        let trigrams: Vec<_> = Trigram::extract("auth").collect();
        assert_eq!(trigrams.len(), 2);
        assert_eq!(trigrams[0].0, *b"aut");
        assert_eq!(trigrams[1].0, *b"uth");
    }

    #[test]
    fn test_trigram_short_string() {
        let trigrams: Vec<_> = Trigram::extract("ab").collect();
        assert!(trigrams.is_empty());
    }

    #[test]
    fn test_trigram_u32_roundtrip() {
        let t = Trigram::new(*b"cat");
        assert_eq!(Trigram::from_u32(t.to_u32()), t);
    }

    #[test]
    fn test_trigram_ordering_matches_byte_order() {
        let a = Trigram::new(*b"aaa");
        let b = Trigram::new(*b"aab");
        assert!(a < b);
    }

    #[test]
    fn test_file_id_roundtrip() {
        let id = FileId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(u32::from(id), 42);
    }
}
