//! The index facade tying tokenizer, tree, query and format together.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use itertools::Itertools as _;

use crate::encoding::{reader, writer, Compression};
use crate::errinput;
use crate::error::Result;
use crate::key::Key;
use crate::query::{evaluate, parse_query};
use crate::storage::{BasicStorage, GuardedStorage, LockFreeStorage, TreeStorage};
use crate::tokenizer::WordTokenizer;
use crate::tree::RadixTree;

/// An in-memory full-text index from tokenized text to keys of type `K`.
///
/// The storage policy `S` picks the concurrency flavor; all flavors share
/// the algorithms and the on-disk format, so an index saved by one loads
/// into any other.
pub struct SearchIndex<K: Key, S: TreeStorage<K> = BasicStorage> {
    tree: RadixTree<K, S>,
    keys_count: AtomicU64,
}

/// Mutex-guarded flavor: shareable across threads, container-level locking.
pub type SharedSearchIndex<K> = SearchIndex<K, GuardedStorage>;

/// Sharded concurrent flavor: fine-grained locking, higher memory.
pub type ConcurrentSearchIndex<K> = SearchIndex<K, LockFreeStorage>;

impl<K: Key, S: TreeStorage<K>> Default for SearchIndex<K, S> {
    fn default() -> Self {
        Self { tree: RadixTree::default(), keys_count: AtomicU64::new(0) }
    }
}

impl<K: Key, S: TreeStorage<K>> SearchIndex<K, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `text` under `key`.
    ///
    /// Counts one add per call, however many words the text yields; a text
    /// with no indexable words still bumps [`Self::keys_count`].
    pub fn add(&self, key: K, text: &str) {
        self.keys_count.fetch_add(1, Ordering::SeqCst);
        for token in WordTokenizer.tokenize(text) {
            self.tree.insert(&key, token.as_bytes());
        }
    }

    /// Indexes a key under its own text representation.
    pub fn add_key(&self, key: K) {
        let text = key.to_text();
        self.add(key, &text);
    }

    /// Indexes pre-split words under `key`, bypassing the default
    /// tokenizer. Words are inserted byte-for-byte; callers with a custom
    /// tokenizer fold and split however they see fit.
    pub fn add_tokens<'a>(&self, key: K, tokens: impl IntoIterator<Item = &'a str>) {
        self.keys_count.fetch_add(1, Ordering::SeqCst);
        for token in tokens {
            self.tree.insert(&key, token.as_bytes());
        }
    }

    /// Evaluates a boolean prefix query.
    ///
    /// The result is unordered and may contain duplicates; see
    /// [`Self::search_unique`] for the deduplicated variant.
    pub fn search(&self, query: &str) -> Vec<K> {
        evaluate(&self.tree, &parse_query(query))
    }

    /// Evaluates a query and dedups the result, preserving first-hit order.
    pub fn search_unique(&self, query: &str) -> Vec<K> {
        self.search(query).into_iter().unique().collect()
    }

    /// Every key whose indexed words include one starting with the given
    /// bytes. Raw token bytes, no folding; undeduplicated.
    pub fn prefix_keys(&self, prefix: &[u8]) -> Vec<K> {
        self.tree.prefix_keys(prefix)
    }

    /// Whether any indexed word starts with the given bytes.
    pub fn contains_prefix(&self, prefix: &[u8]) -> bool {
        let mut found = false;
        self.tree.for_each_prefix_key(prefix, &mut |_| found = true);
        found
    }

    /// Every key in every node bag, in tree order, duplicates included.
    pub fn all_keys(&self) -> Vec<K> {
        self.tree.all_keys()
    }

    /// Removes one key everywhere it appears.
    pub fn remove(&self, key: &K) -> bool {
        self.remove_many(std::slice::from_ref(key)) == 1
    }

    /// Removes each of the given keys everywhere it appears. Returns how
    /// many of them were present, and lowers [`Self::keys_count`] by that.
    pub fn remove_many(&self, keys: &[K]) -> usize {
        let found = self.tree.remove(keys);
        self.keys_count.fetch_sub(found as u64, Ordering::SeqCst);
        if found > 0 {
            tracing::debug!(requested = keys.len(), found, "removed keys");
        }
        found
    }

    /// The number of adds performed, less removed keys. After a load this
    /// is the number of distinct keys in the stream, which can differ from
    /// the live add count when one key was added repeatedly.
    pub fn keys_count(&self) -> u64 {
        self.keys_count.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Saves the index to a caller-owned stream.
    ///
    /// Not synchronized against concurrent writers; quiesce them first.
    pub fn save_to<W: Write + ?Sized>(&self, writer: &mut W, compression: Compression) -> Result<()> {
        writer::save(&self.tree, writer, compression)
    }

    /// Loads an index from a caller-owned stream. On failure nothing is
    /// constructed; the stream may have been partially consumed.
    pub fn load_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let (tree, distinct_keys) = reader::load(reader)?;
        Ok(Self { tree, keys_count: AtomicU64::new(distinct_keys as u64) })
    }

    /// Saves to a file, creating or truncating it.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P, compression: Compression) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return errinput!("empty file path");
        }
        let mut file = BufWriter::new(File::create(path)?);
        self.save_to(&mut file, compression)?;
        file.flush()?;
        Ok(())
    }

    /// Loads from a file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return errinput!("empty file path");
        }
        let mut file = BufReader::new(File::open(path)?);
        Self::load_from(&mut file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sorted(mut keys: Vec<String>) -> Vec<String> {
        keys.sort();
        keys
    }

    fn strings_index() -> SearchIndex<String> {
        let index = SearchIndex::new();
        index.add("a".to_string(), "This is a simple phrase");
        index.add("b".to_string(), "And this one is another phrase a bit longer");
        index.add(
            "c".to_string(),
            "The last phrase (this one) contains french (with diacritics) like 'réveillez-vous à l'heure!'",
        );
        index
    }

    fn assert_strings_queries<S: TreeStorage<String>>(index: &SearchIndex<String, S>) {
        assert_eq!(sorted(index.search_unique("this")), vec!["a", "b", "c"]);
        assert_eq!(sorted(index.search_unique("this is")), vec!["a", "b"]);
        assert_eq!(sorted(index.search_unique("simple | with")), vec!["a", "c"]);
        assert!(index.search_unique("that").is_empty());
        assert_eq!(sorted(index.search_unique("the")), vec!["c"]);
        assert_eq!(sorted(index.search_unique("rev")), vec!["c"]);
        assert_eq!(sorted(index.search_unique("-one")), vec!["a"]);
        assert!(index.search_unique("-this | last").is_empty());
    }

    #[test]
    fn test_strings_index_queries() {
        let index = strings_index();
        assert_eq!(index.keys_count(), 3);
        assert_strings_queries(&index);
    }

    #[test]
    fn test_strings_index_round_trip() {
        let index = strings_index();
        let mut bytes = Vec::new();
        index.save_to(&mut bytes, Compression::Gzip).expect("save failed");

        let reloaded: SearchIndex<String> =
            SearchIndex::load_from(&mut bytes.as_slice()).expect("load failed");
        assert_eq!(reloaded.keys_count(), 3);
        assert_strings_queries(&reloaded);
    }

    #[test]
    fn test_round_trip_across_flavors() {
        let index = strings_index();
        let mut bytes = Vec::new();
        index.save_to(&mut bytes, Compression::None).expect("save failed");

        let guarded: SharedSearchIndex<String> =
            SearchIndex::load_from(&mut bytes.as_slice()).expect("guarded load failed");
        assert_strings_queries(&guarded);

        let concurrent: ConcurrentSearchIndex<String> =
            SearchIndex::load_from(&mut bytes.as_slice()).expect("concurrent load failed");
        assert_strings_queries(&concurrent);
    }

    #[test]
    fn test_remove_lowers_count_and_empties() {
        let index = strings_index();
        assert!(index.remove(&"a".to_string()));
        assert_eq!(index.keys_count(), 2);
        assert!(!index.remove(&"a".to_string()));

        let all = ["a", "b", "c"].map(String::from);
        assert_eq!(index.remove_many(&all), 2);
        assert_eq!(index.keys_count(), 0);
        assert!(index.all_keys().is_empty());
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    struct Customer {
        id: u32,
        first_name: String,
        last_name: String,
        age: u8,
    }

    impl Customer {
        fn new(id: u32, first_name: &str, last_name: &str, age: u8) -> Self {
            Self {
                id,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                age,
            }
        }
    }

    impl Key for Customer {
        fn to_text(&self) -> String {
            format!("{}\t{}\t{}\t{}", self.id, self.first_name, self.last_name, self.age)
        }

        fn from_text(text: &str) -> crate::error::Result<Self> {
            let mut fields = text.split('\t');
            let mut next = || {
                fields
                    .next()
                    .ok_or_else(|| Error::KeyCodec(format!("missing customer field in {text:?}")))
            };
            let id = next()?
                .parse()
                .map_err(|e| Error::KeyCodec(format!("bad customer id: {e}")))?;
            let first_name = next()?.to_string();
            let last_name = next()?.to_string();
            let age = next()?
                .parse()
                .map_err(|e| Error::KeyCodec(format!("bad customer age: {e}")))?;
            Ok(Self { id, first_name, last_name, age })
        }
    }

    fn customers_index() -> SearchIndex<Customer> {
        let index = SearchIndex::new();
        index.add_key(Customer::new(0, "alice", "hunting-bobby-crown", 25));
        index.add_key(Customer::new(1, "bob", "albert-down", 32));
        index.add_key(Customer::new(2, "carl", "ctrl-alt", 15));
        index
    }

    fn ids(keys: Vec<Customer>) -> Vec<u32> {
        let mut ids: Vec<u32> = keys.into_iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_customer_keys_search() {
        let index = customers_index();
        assert_eq!(ids(index.search_unique("al")), vec![0, 1, 2]);
        assert_eq!(ids(index.search_unique("b")), vec![0, 1]);
        assert_eq!(ids(index.search_unique("a -c")), vec![1]);
        assert_eq!(ids(index.search_unique("a c")), vec![0, 2]);
        assert_eq!(ids(index.search_unique("a d")), vec![1]);
        assert_eq!(ids(index.search_unique("hunting a")), vec![0]);
    }

    #[test]
    fn test_customer_keys_round_trip() {
        let index = customers_index();
        let mut bytes = Vec::new();
        index.save_to(&mut bytes, Compression::None).expect("save failed");
        let reloaded: SearchIndex<Customer> =
            SearchIndex::load_from(&mut bytes.as_slice()).expect("load failed");
        assert_eq!(reloaded.keys_count(), 3);
        assert_eq!(ids(reloaded.search_unique("hunting a")), vec![0]);
    }

    #[test]
    fn test_keys_count_counts_adds_not_distinct_keys() {
        let index: SearchIndex<String> = SearchIndex::new();
        index.add("a".to_string(), "first text");
        index.add("a".to_string(), "second text");
        index.add("b".to_string(), "!!! 123");
        assert_eq!(index.keys_count(), 3);

        // A load resets the counter to the number of distinct stream keys.
        let mut bytes = Vec::new();
        index.save_to(&mut bytes, Compression::None).expect("save failed");
        let reloaded: SearchIndex<String> =
            SearchIndex::load_from(&mut bytes.as_slice()).expect("load failed");
        assert_eq!(reloaded.keys_count(), 2);
    }

    #[test]
    fn test_add_tokens_bypasses_tokenizer() {
        let index: SearchIndex<u64> = SearchIndex::new();
        index.add_tokens(1, ["exact-bytes!", "word"]);
        assert_eq!(index.prefix_keys(b"exact-b"), vec![1]);
        assert_eq!(index.keys_count(), 1);
    }

    #[test]
    fn test_contains_prefix() {
        let index = strings_index();
        assert!(index.contains_prefix(b"phr"));
        assert!(!index.contains_prefix(b"zzz"));
    }

    #[test]
    fn test_duplicate_adds_accumulate_in_basic_flavor() {
        let index: SearchIndex<String> = SearchIndex::new();
        index.add("a".to_string(), "word");
        index.add("a".to_string(), "word");
        assert_eq!(index.prefix_keys(b"word").len(), 2);
        assert_eq!(index.search_unique("word"), vec!["a"]);
    }

    #[test]
    fn test_set_flavors_dedupe_duplicate_adds() {
        let index: SharedSearchIndex<String> = SearchIndex::new();
        index.add("a".to_string(), "word word word");
        assert_eq!(index.prefix_keys(b"word").len(), 1);
        assert_eq!(index.keys_count(), 1);
    }

    #[test]
    fn test_concurrent_adds_and_searches() {
        let index: std::sync::Arc<ConcurrentSearchIndex<u64>> = Default::default();
        let writers: Vec<_> = (0..4u64)
            .map(|w| {
                let index = index.clone();
                std::thread::spawn(move || {
                    let tag = char::from(b'a' + w as u8);
                    for i in 0..50 {
                        let key = w * 100 + i;
                        index.add(key, &format!("common word{tag} item"));
                    }
                })
            })
            .collect();
        for handle in writers {
            handle.join().expect("writer panicked");
        }
        assert_eq!(index.keys_count(), 200);
        assert_eq!(index.search_unique("common").len(), 200);
        assert_eq!(index.search_unique("worda").len(), 50);
    }

    #[test]
    fn test_empty_path_rejected() {
        let index = strings_index();
        assert!(matches!(
            index.save_to_path("", Compression::None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            SearchIndex::<String>::load_from_path(""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("index.fts");

        let index = strings_index();
        index.save_to_path(&path, Compression::Gzip).expect("save failed");
        let reloaded: SearchIndex<String> =
            SearchIndex::load_from_path(&path).expect("load failed");
        assert_eq!(reloaded.keys_count(), 3);
        assert_strings_queries(&reloaded);
    }
}
