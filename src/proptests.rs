//! Model-based properties of the tree and the save format.
//!
//! A flat list of `(key, token)` insertions is the model: the keys a
//! prefix lookup must return are exactly the entries whose token starts
//! with the prefix, one occurrence per insertion.

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::encoding::Compression;
use crate::index::SearchIndex;
use crate::storage::{BasicStorage, EdgeMap, TreeStorage};
use crate::tree::RadixTree;

type Tree = RadixTree<u64, BasicStorage>;
type Children = <BasicStorage as TreeStorage<u64>>::Children;

/// Short tokens over a three-letter alphabet, to force edge splits.
fn token() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c')], 1..6)
}

fn entries() -> impl Strategy<Value = Vec<(u64, Vec<u8>)>> {
    proptest::collection::vec((0u64..10, token()), 0..40)
}

fn build_tree(entries: &[(u64, Vec<u8>)]) -> Tree {
    let tree = Tree::new();
    for (key, token) in entries {
        tree.insert(key, token);
    }
    tree
}

/// Every non-empty prefix of every inserted token, plus probes one byte
/// past each token, which must behave like any other absent path.
fn probe_prefixes(entries: &[(u64, Vec<u8>)]) -> BTreeSet<Vec<u8>> {
    let mut prefixes = BTreeSet::new();
    for (_, token) in entries {
        for end in 1..=token.len() {
            prefixes.insert(token[..end].to_vec());
        }
        let mut overshoot = token.clone();
        overshoot.push(b'd');
        prefixes.insert(overshoot);
    }
    prefixes
}

fn model_prefix_keys(entries: &[(u64, Vec<u8>)], prefix: &[u8]) -> Vec<u64> {
    let mut keys: Vec<u64> = entries
        .iter()
        .filter(|(_, token)| token.starts_with(prefix))
        .map(|(key, _)| *key)
        .collect();
    keys.sort_unstable();
    keys
}

fn sibling_groups(children: &Children, groups: &mut Vec<Vec<Vec<u8>>>) {
    groups.push(children.edges().iter().map(|e| e.to_vec()).collect());
    children.for_each(&mut |node| {
        if let Some(lower) = node.children() {
            sibling_groups(lower, groups);
        }
    });
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

proptest! {
    /// No two sibling edges ever share a non-empty byte prefix, after any
    /// insertion sequence.
    #[test]
    fn prop_sibling_edges_disjoint(entries in entries()) {
        let tree = build_tree(&entries);
        let mut groups = Vec::new();
        sibling_groups(tree.root(), &mut groups);
        for group in groups {
            for (i, a) in group.iter().enumerate() {
                for b in &group[i + 1..] {
                    prop_assert_eq!(
                        common_prefix_len(a, b), 0,
                        "siblings {:?} and {:?} share a prefix", a, b
                    );
                }
            }
        }
    }

    /// Prefix lookups return exactly the model's occurrences: complete for
    /// every prefix of every inserted token, sound for every probe.
    #[test]
    fn prop_prefix_lookup_matches_model(entries in entries()) {
        let tree = build_tree(&entries);
        for prefix in probe_prefixes(&entries) {
            let mut actual = tree.prefix_keys(&prefix);
            actual.sort_unstable();
            prop_assert_eq!(actual, model_prefix_keys(&entries, &prefix), "prefix {:?}", prefix);
        }
    }

    /// Removal scrubs a key from every bag and reports whether it was
    /// present.
    #[test]
    fn prop_remove_scrubs_key(entries in entries(), victim in 0u64..10) {
        let tree = build_tree(&entries);
        let was_present = entries.iter().any(|(key, _)| *key == victim);
        prop_assert_eq!(tree.remove(&[victim]), usize::from(was_present));
        prop_assert!(tree.all_keys().into_iter().all(|key| key != victim));
    }

    /// A save/load cycle preserves every lookup and re-saves to identical
    /// bytes; the reloaded counter equals the distinct key count.
    #[test]
    fn prop_round_trip(entries in entries()) {
        let index: SearchIndex<u64> = SearchIndex::new();
        for (key, token) in &entries {
            index.add_tokens(*key, [std::str::from_utf8(token).unwrap()]);
        }

        let mut bytes = Vec::new();
        index.save_to(&mut bytes, Compression::None).unwrap();
        let reloaded: SearchIndex<u64> = SearchIndex::load_from(&mut bytes.as_slice()).unwrap();

        for prefix in probe_prefixes(&entries) {
            let mut expected = index.prefix_keys(&prefix);
            let mut actual = reloaded.prefix_keys(&prefix);
            expected.sort_unstable();
            actual.sort_unstable();
            prop_assert_eq!(expected, actual, "prefix {:?}", prefix);
        }

        let distinct: BTreeSet<u64> = entries.iter().map(|(key, _)| *key).collect();
        prop_assert_eq!(reloaded.keys_count(), distinct.len() as u64);

        let mut resaved = Vec::new();
        reloaded.save_to(&mut resaved, Compression::None).unwrap();
        prop_assert_eq!(bytes, resaved);
    }
}
