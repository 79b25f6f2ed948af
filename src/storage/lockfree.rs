//! Sharded concurrent storage over `dashmap`.
//!
//! The child table is a `DashMap` keyed by edge bytes and the key bag is a
//! `DashSet`, both hashed with `ahash`. Mutation takes only the shard the
//! edge hashes into, so writers on different subtrees rarely contend.
//! Iteration is weakly consistent: a walk concurrent with writers sees
//! some mix of old and new entries, never a torn one.

use std::hash::Hash;

use dashmap::{DashMap, DashSet};

use crate::error::Result;
use crate::storage::{EdgeMap, KeyBag, TreeStorage};
use crate::tree::node::Node;

/// Sharded concurrent storage policy.
pub struct LockFreeStorage;

impl<K: Clone + Eq + Hash> TreeStorage<K> for LockFreeStorage {
    type Bag = ConcurrentBag<K>;
    type Children = ConcurrentEdgeMap<Node<K, LockFreeStorage>>;
}

/// Concurrent key bag with set semantics.
pub struct ConcurrentBag<K: Eq + Hash>(DashSet<K, ahash::RandomState>);

impl<K: Eq + Hash> Default for ConcurrentBag<K> {
    fn default() -> Self {
        Self(DashSet::with_hasher(ahash::RandomState::new()))
    }
}

impl<K: Clone + Eq + Hash> KeyBag<K> for ConcurrentBag<K> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn add(&self, key: K) {
        self.0.insert(key);
    }

    fn remove(&self, key: &K) -> bool {
        self.0.remove(key).is_some()
    }

    fn for_each(&self, f: &mut dyn FnMut(&K)) {
        for key in self.0.iter() {
            f(key.key());
        }
    }
}

/// Concurrent child table keyed by edge bytes.
pub struct ConcurrentEdgeMap<V>(DashMap<Box<[u8]>, V, ahash::RandomState>);

impl<V> Default for ConcurrentEdgeMap<V> {
    fn default() -> Self {
        Self(DashMap::with_hasher(ahash::RandomState::new()))
    }
}

impl<V> EdgeMap<V> for ConcurrentEdgeMap<V> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&self, edge: Box<[u8]>, value: V) {
        self.0.insert(edge, value);
    }

    fn remove(&self, edge: &[u8]) -> Option<V> {
        self.0.remove(edge).map(|(_, value)| value)
    }

    fn with<R>(&self, edge: &[u8], f: impl FnOnce(&V) -> R) -> Option<R> {
        self.0.get(edge).map(|entry| f(entry.value()))
    }

    fn with_mut<R>(&self, edge: &[u8], f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.0.get_mut(edge).map(|mut entry| f(entry.value_mut()))
    }

    fn edges(&self) -> Vec<Box<[u8]>> {
        self.0.iter().map(|entry| entry.key().clone()).collect()
    }

    fn try_for_each(&self, f: &mut dyn FnMut(&V) -> Result<()>) -> Result<()> {
        for entry in self.0.iter() {
            f(entry.value())?;
        }
        Ok(())
    }
}
