//! Query tokenization and boolean evaluation.
//!
//! Queries share the index's word folding, with three operator sigils
//! layered on top: `-` marks the next word NOT, `|` marks it OR, `+`
//! marks it AND. A sigil may prefix the word directly or stand alone
//! before it; unmarked words are AND. Every token is a prefix match
//! against the tree, and a malformed query never fails, it just matches
//! whatever its recognizable words match.

use ahash::AHashSet;

use crate::storage::TreeStorage;
use crate::tokenizer::fold;
use crate::tree::RadixTree;

/// Boolean role of one query word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryOp {
    And,
    Or,
    Not,
}

/// One classified query word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryToken {
    pub op: QueryOp,
    pub text: String,
}

impl QueryToken {
    fn new(op: QueryOp, text: String) -> Self {
        Self { op, text }
    }
}

/// Splits a query into classified words.
///
/// The text is folded exactly like indexed text, so `Rév` and `rev` are
/// the same token. A pending sigil survives intervening separators and
/// attaches to the next word; emitting a word resets the role to AND.
pub fn parse_query(query: &str) -> Vec<QueryToken> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut pending: Option<QueryOp> = None;

    let mut flush = |word: &mut String, pending: &mut Option<QueryOp>| {
        if !word.is_empty() {
            let op = pending.take().unwrap_or(QueryOp::And);
            tokens.push(QueryToken::new(op, std::mem::take(word)));
        }
    };

    for ch in fold(query).chars() {
        if ch.is_ascii_alphabetic() {
            word.push(ch);
            continue;
        }
        flush(&mut word, &mut pending);
        match ch {
            '-' => pending = Some(QueryOp::Not),
            '|' => pending = Some(QueryOp::Or),
            '+' => pending = Some(QueryOp::And),
            _ => {}
        }
    }
    flush(&mut word, &mut pending);
    tokens
}

/// Evaluates classified tokens against the tree.
///
/// The result carries no ordering promise and, on the all-OR path, no
/// deduplication either; callers wanting distinct keys dedup themselves.
pub fn evaluate<K, S>(tree: &RadixTree<K, S>, tokens: &[QueryToken]) -> Vec<K>
where
    K: Clone + Eq + std::hash::Hash,
    S: TreeStorage<K>,
{
    if tokens.is_empty() {
        return Vec::new();
    }

    // A non-NOT head followed by an all-OR tail short-circuits to the raw
    // concatenation of every token's lookup, the head's own role included.
    if tokens[0].op != QueryOp::Not && tokens[1..].iter().all(|t| t.op == QueryOp::Or) {
        let mut keys = Vec::new();
        for token in tokens {
            tree.for_each_prefix_key(token.text.as_bytes(), &mut |k| keys.push(k.clone()));
        }
        return keys;
    }

    // A lone NOT token inverts against the whole key population.
    if let [token] = tokens {
        let excluded = lookup_set(tree, &token.text);
        let mut seen = AHashSet::new();
        let mut keys = Vec::new();
        tree.for_each_key(&mut |k| {
            if !excluded.contains(k) && seen.insert(k.clone()) {
                keys.push(k.clone());
            }
        });
        return keys;
    }

    // General case: OR union, then AND narrowing in order, then NOT.
    let mut result: AHashSet<K> = AHashSet::new();
    for token in tokens.iter().filter(|t| t.op == QueryOp::Or) {
        tree.for_each_prefix_key(token.text.as_bytes(), &mut |k| {
            result.insert(k.clone());
        });
    }

    let mut first_and = true;
    for token in tokens.iter().filter(|t| t.op == QueryOp::And) {
        if result.is_empty() && first_and {
            result = lookup_set(tree, &token.text);
        } else {
            let narrowing = lookup_set(tree, &token.text);
            result.retain(|k| narrowing.contains(k));
        }
        first_and = false;
    }

    for token in tokens.iter().filter(|t| t.op == QueryOp::Not) {
        let excluded = lookup_set(tree, &token.text);
        result.retain(|k| !excluded.contains(k));
    }

    result.into_iter().collect()
}

fn lookup_set<K, S>(tree: &RadixTree<K, S>, text: &str) -> AHashSet<K>
where
    K: Clone + Eq + std::hash::Hash,
    S: TreeStorage<K>,
{
    let mut keys = AHashSet::new();
    tree.for_each_prefix_key(text.as_bytes(), &mut |k| {
        keys.insert(k.clone());
    });
    keys
}
