//! The byte-level radix tree.
//!
//! Edges are labeled with non-empty byte strings and no two sibling edges
//! share a non-empty byte prefix, so any insertion path diverges at
//! exactly one child. Keys accumulate in node bags; lookups walk the path
//! covering a prefix and stream every key at or below it.
//!
//! All container access goes through the storage policy, so the same
//! algorithms back the unsynchronized, guarded and sharded flavors.

pub mod node;

use crate::storage::{EdgeMap, KeyBag, TreeStorage};
use node::Node;

/// Length of the longest common prefix of two byte strings.
fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    let min_len = a.len().min(b.len());
    for i in 0..min_len {
        if a[i] != b[i] {
            return i;
        }
    }
    min_len
}

/// A radix tree mapping token bytes to bags of keys.
///
/// The root branch has an empty edge and never holds keys, so only its
/// child table is materialized here.
pub struct RadixTree<K, S: TreeStorage<K>> {
    root: S::Children,
}

impl<K, S: TreeStorage<K>> Default for RadixTree<K, S> {
    fn default() -> Self {
        Self { root: S::Children::default() }
    }
}

impl<K, S> RadixTree<K, S>
where
    K: Clone + Eq + std::hash::Hash,
    S: TreeStorage<K>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The root child table. The serializer walks it directly.
    pub(crate) fn root(&self) -> &S::Children {
        &self.root
    }

    /// Rebuilds a tree around an already-populated root table.
    pub(crate) fn from_root(root: S::Children) -> Self {
        Self { root }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Inserts one tokenized word for a key. Every node on the token's
    /// path keeps its own bag, and the key lands in the bag of the node
    /// whose path spells exactly the token. Empty tokens are a no-op.
    pub fn insert(&self, key: &K, token: &[u8]) {
        if token.is_empty() {
            return;
        }
        Self::insert_into(&self.root, token, key);
    }

    fn insert_into(children: &S::Children, token: &[u8], key: &K) {
        let edges = children.edges();

        // A child spelling exactly this token: the key lands there. A bare
        // branch is promoted to a keyed one in place.
        if edges.iter().any(|e| e.as_ref() == token) {
            children.with_mut(token, |child| child.add_key(key.clone()));
            return;
        }

        // At most one sibling can share a prefix with the token, since
        // sibling edges never share one among themselves.
        let shared = edges.iter().find_map(|edge| {
            let m = common_prefix(edge, token);
            (m > 0).then(|| (edge.clone(), m))
        });

        let Some((edge, m)) = shared else {
            children.insert(token.into(), Node::leaf(token, key.clone()));
            return;
        };

        if m == edge.len() {
            // The child's edge is a strict prefix of the token: descend
            // into a branch, or grow a leaf downward.
            children.with_mut(&edge, |child| match child {
                Node::NoKeysBranch { children: lower, .. }
                | Node::KeysBranch { children: lower, .. } => {
                    Self::insert_into(lower, &token[m..], key)
                }
                Node::Leaf { .. } => child.grow_below(&token[m..], key.clone()),
            });
            return;
        }

        // The token diverges inside the child's edge: split the edge at
        // the divergence point and hang both remainders below it.
        let Some(mut detached) = children.remove(&edge) else {
            return;
        };
        detached.set_edge(edge[m..].into());
        let lower = S::Children::default();
        lower.insert(edge[m..].into(), detached);
        let top = if m == token.len() {
            // Token exhausted at the split point: the split node itself
            // carries the key.
            let keys = S::Bag::default();
            keys.add(key.clone());
            Node::KeysBranch { edge: token.into(), keys, children: lower }
        } else {
            lower.insert(token[m..].into(), Node::leaf(&token[m..], key.clone()));
            Node::NoKeysBranch { edge: edge[..m].into(), children: lower }
        };
        children.insert(edge[..m].into(), top);
    }

    /// Streams every key stored at or under the first node whose path
    /// covers `prefix`. No deduplication, no ordering promise.
    pub fn for_each_prefix_key(&self, prefix: &[u8], f: &mut dyn FnMut(&K)) {
        self.root
            .for_each(&mut |child| Self::visit_prefix(child, prefix, 0, f));
    }

    fn visit_prefix(node: &Node<K, S>, bytes: &[u8], offset: usize, f: &mut dyn FnMut(&K)) {
        let rest = &bytes[offset..];
        let m = common_prefix(node.edge(), rest);
        if m == 0 {
            return;
        }
        if m == rest.len() {
            // Query exhausted on this edge: everything below matches.
            Self::visit_subtree(node, f);
            return;
        }
        if m < node.edge().len() {
            // Diverged mid-edge with query bytes left over.
            return;
        }
        if let Some(children) = node.children() {
            children.for_each(&mut |child| Self::visit_prefix(child, bytes, offset + m, f));
        }
    }

    /// Streams every key in every bag, parents before children, siblings
    /// in child-table order.
    pub fn for_each_key(&self, f: &mut dyn FnMut(&K)) {
        self.root.for_each(&mut |child| Self::visit_subtree(child, f));
    }

    fn visit_subtree(node: &Node<K, S>, f: &mut dyn FnMut(&K)) {
        if let Some(keys) = node.keys() {
            keys.for_each(f);
        }
        if let Some(children) = node.children() {
            children.for_each(&mut |child| Self::visit_subtree(child, f));
        }
    }

    /// Collecting convenience over [`Self::for_each_prefix_key`].
    pub fn prefix_keys(&self, prefix: &[u8]) -> Vec<K> {
        let mut keys = Vec::new();
        self.for_each_prefix_key(prefix, &mut |k| keys.push(k.clone()));
        keys
    }

    /// Collecting convenience over [`Self::for_each_key`].
    pub fn all_keys(&self) -> Vec<K> {
        let mut keys = Vec::new();
        self.for_each_key(&mut |k| keys.push(k.clone()));
        keys
    }

    /// Deletes the given keys from every bag they appear in. Returns how
    /// many of the inputs were found at least once. Emptied bags and
    /// branches are left in place; the tree is never compacted.
    pub fn remove(&self, keys: &[K]) -> usize {
        let mut found = vec![false; keys.len()];
        Self::remove_from(&self.root, keys, &mut found);
        found.into_iter().filter(|hit| *hit).count()
    }

    fn remove_from(children: &S::Children, keys: &[K], found: &mut [bool]) {
        children.for_each(&mut |node| {
            if let Some(bag) = node.keys() {
                for (i, key) in keys.iter().enumerate() {
                    if bag.remove(key) {
                        found[i] = true;
                    }
                }
            }
            if let Some(lower) = node.children() {
                Self::remove_from(lower, keys, found);
            }
        });
    }
}
