//! Unsynchronized storage: plain vectors behind `RefCell`.
//!
//! The child table is an insertion-ordered list of `(edge, node)` pairs
//! scanned linearly; branch fan-out is bounded by distinct first bytes, so
//! the scan stays short. The key bag appends duplicates. `RefCell` makes
//! both containers `!Sync`, which is how this flavor's "not safe for
//! concurrent mutation" is enforced at compile time.

use std::cell::RefCell;

use crate::error::Result;
use crate::storage::{EdgeMap, KeyBag, TreeStorage};
use crate::tree::node::Node;

/// Single-threaded storage policy.
pub struct BasicStorage;

impl<K: Clone + Eq + std::hash::Hash> TreeStorage<K> for BasicStorage {
    type Bag = ListBag<K>;
    type Children = VecEdgeMap<Node<K, BasicStorage>>;
}

/// Append-list key bag. Duplicate additions accumulate.
pub struct ListBag<K>(RefCell<Vec<K>>);

impl<K> Default for ListBag<K> {
    fn default() -> Self {
        Self(RefCell::new(Vec::new()))
    }
}

impl<K: Clone + PartialEq> KeyBag<K> for ListBag<K> {
    fn len(&self) -> usize {
        self.0.borrow().len()
    }

    fn add(&self, key: K) {
        self.0.borrow_mut().push(key);
    }

    fn remove(&self, key: &K) -> bool {
        let mut keys = self.0.borrow_mut();
        let before = keys.len();
        keys.retain(|k| k != key);
        keys.len() != before
    }

    fn for_each(&self, f: &mut dyn FnMut(&K)) {
        for key in self.0.borrow().iter() {
            f(key);
        }
    }
}

/// Insertion-ordered child table over a vector of `(edge, value)` pairs.
pub struct VecEdgeMap<V>(RefCell<Vec<(Box<[u8]>, V)>>);

impl<V> Default for VecEdgeMap<V> {
    fn default() -> Self {
        Self(RefCell::new(Vec::new()))
    }
}

impl<V> EdgeMap<V> for VecEdgeMap<V> {
    fn len(&self) -> usize {
        self.0.borrow().len()
    }

    fn insert(&self, edge: Box<[u8]>, value: V) {
        let mut entries = self.0.borrow_mut();
        match entries.iter_mut().find(|(e, _)| *e == edge) {
            Some(entry) => entry.1 = value,
            None => entries.push((edge, value)),
        }
    }

    fn remove(&self, edge: &[u8]) -> Option<V> {
        let mut entries = self.0.borrow_mut();
        let position = entries.iter().position(|(e, _)| e.as_ref() == edge)?;
        Some(entries.remove(position).1)
    }

    fn with<R>(&self, edge: &[u8], f: impl FnOnce(&V) -> R) -> Option<R> {
        let entries = self.0.borrow();
        let (_, value) = entries.iter().find(|(e, _)| e.as_ref() == edge)?;
        Some(f(value))
    }

    fn with_mut<R>(&self, edge: &[u8], f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut entries = self.0.borrow_mut();
        let (_, value) = entries.iter_mut().find(|(e, _)| e.as_ref() == edge)?;
        Some(f(value))
    }

    fn edges(&self) -> Vec<Box<[u8]>> {
        self.0.borrow().iter().map(|(e, _)| e.clone()).collect()
    }

    fn try_for_each(&self, f: &mut dyn FnMut(&V) -> Result<()>) -> Result<()> {
        for (_, value) in self.0.borrow().iter() {
            f(value)?;
        }
        Ok(())
    }
}
