//! # radixfts
//!
//! An embeddable in-memory full-text search index keyed by arbitrary user
//! values. Text is split into words, words live in a byte-level radix
//! tree, and queries are a small boolean language (`-` NOT, `|` OR, `+`
//! AND) over prefix matches. The index saves to and loads from a compact,
//! optionally gzip-compressed binary stream.
//!
//! ```rust
//! use radixfts::{Compression, SearchIndex};
//!
//! let index: SearchIndex<String> = SearchIndex::new();
//! index.add("a".to_string(), "This is a simple phrase");
//! index.add("b".to_string(), "And this one is another phrase");
//!
//! assert_eq!(index.search_unique("simple"), vec!["a".to_string()]);
//! assert_eq!(index.search_unique("-simple"), vec!["b".to_string()]);
//!
//! let mut bytes = Vec::new();
//! index.save_to(&mut bytes, Compression::Gzip).unwrap();
//! let reloaded: SearchIndex<String> = SearchIndex::load_from(&mut bytes.as_slice()).unwrap();
//! assert_eq!(reloaded.keys_count(), 2);
//! ```

pub mod encoding;
pub mod error;
pub mod index;
pub mod key;
pub mod query;
pub mod storage;
pub mod tokenizer;
pub mod tree;

#[cfg(test)]
mod proptests;

pub use encoding::Compression;
pub use error::{Error, Result};
pub use index::{ConcurrentSearchIndex, SearchIndex, SharedSearchIndex};
pub use key::Key;
