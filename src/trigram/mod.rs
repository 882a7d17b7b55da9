//! On-disk trigram index store: the write-once, read-many inverted index
//! mapping each 3-byte shingle to the sorted set of file IDs containing it.

pub mod query;
pub mod reader;
pub mod writer;

pub use query::{eval, PostingSource, TrigramQuery};
pub use reader::{ReaderError, TrigramReader};
pub use writer::{TrigramWriter, MAX_FILE_LEN, MAX_TEXT_TRIGRAMS};
