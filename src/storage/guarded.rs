//! Mutex-guarded storage: the basic containers behind `std::sync::Mutex`.
//!
//! Each container serializes its own readers and writers; operations on
//! different containers interleave freely, so concurrent inserts of
//! different tokens are not globally atomic. The key bag keeps the list
//! representation but dedupes on add, giving this flavor set semantics.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::storage::{EdgeMap, KeyBag, TreeStorage};
use crate::tree::node::Node;

/// Mutex-guarded storage policy.
pub struct GuardedStorage;

impl<K: Clone + Eq + std::hash::Hash> TreeStorage<K> for GuardedStorage {
    type Bag = GuardedBag<K>;
    type Children = GuardedEdgeMap<Node<K, GuardedStorage>>;
}

// A poisoned container is still structurally sound: every mutation leaves
// the vector valid at the point the guard drops.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered key bag with set semantics behind a mutex.
pub struct GuardedBag<K>(Mutex<Vec<K>>);

impl<K> Default for GuardedBag<K> {
    fn default() -> Self {
        Self(Mutex::new(Vec::new()))
    }
}

impl<K: Clone + PartialEq> KeyBag<K> for GuardedBag<K> {
    fn len(&self) -> usize {
        lock(&self.0).len()
    }

    fn add(&self, key: K) {
        let mut keys = lock(&self.0);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    fn remove(&self, key: &K) -> bool {
        let mut keys = lock(&self.0);
        let before = keys.len();
        keys.retain(|k| k != key);
        keys.len() != before
    }

    fn for_each(&self, f: &mut dyn FnMut(&K)) {
        // Snapshot so the lock is not held across the caller's closure.
        let snapshot: Vec<K> = lock(&self.0).clone();
        for key in &snapshot {
            f(key);
        }
    }
}

/// Insertion-ordered child table behind a mutex.
pub struct GuardedEdgeMap<V>(Mutex<Vec<(Box<[u8]>, V)>>);

impl<V> Default for GuardedEdgeMap<V> {
    fn default() -> Self {
        Self(Mutex::new(Vec::new()))
    }
}

impl<V> EdgeMap<V> for GuardedEdgeMap<V> {
    fn len(&self) -> usize {
        lock(&self.0).len()
    }

    fn insert(&self, edge: Box<[u8]>, value: V) {
        let mut entries = lock(&self.0);
        match entries.iter_mut().find(|(e, _)| *e == edge) {
            Some(entry) => entry.1 = value,
            None => entries.push((edge, value)),
        }
    }

    fn remove(&self, edge: &[u8]) -> Option<V> {
        let mut entries = lock(&self.0);
        let position = entries.iter().position(|(e, _)| e.as_ref() == edge)?;
        Some(entries.remove(position).1)
    }

    fn with<R>(&self, edge: &[u8], f: impl FnOnce(&V) -> R) -> Option<R> {
        let entries = lock(&self.0);
        let (_, value) = entries.iter().find(|(e, _)| e.as_ref() == edge)?;
        Some(f(value))
    }

    fn with_mut<R>(&self, edge: &[u8], f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut entries = lock(&self.0);
        let (_, value) = entries.iter_mut().find(|(e, _)| e.as_ref() == edge)?;
        Some(f(value))
    }

    fn edges(&self) -> Vec<Box<[u8]>> {
        lock(&self.0).iter().map(|(e, _)| e.clone()).collect()
    }

    fn try_for_each(&self, f: &mut dyn FnMut(&V) -> Result<()>) -> Result<()> {
        // The lock is held while visiting: values cannot be cloned out, and
        // traversal only ever takes locks downward, parent to child.
        for (_, value) in lock(&self.0).iter() {
            f(value)?;
        }
        Ok(())
    }
}
