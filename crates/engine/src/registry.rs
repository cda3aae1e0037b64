//! Bidirectional key <-> index registry
//!
//! Every entity in a group is known both by the caller's key (an editor,
//! a document id) and by the integer index that addresses it in the tree.
//! The registry owns the generation counter that hands out indices and
//! the set of released indices waiting to be reused.
//!
//! # Reuse policy
//!
//! - [`IndexReuse::Never`]: indices grow strictly; released ones are dropped
//! - [`IndexReuse::LowestFree`]: the smallest released index is handed out
//!   before the counter advances, so churn does not grow the index space
//!
//! Removal is split in two steps ([`detach`](EntityRegistry::detach) and
//! [`release`](EntityRegistry::release)) so a caller can keep an index
//! reserved while it still cleans up whatever lived at that index.

use crate::config::IndexReuse;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

/// Key <-> index map with an explicit generation counter
#[derive(Debug, Clone)]
pub struct EntityRegistry<K> {
    by_key: FxHashMap<K, usize>,
    by_index: BTreeMap<usize, K>,
    /// Next never-used index
    next_index: usize,
    free: BTreeSet<usize>,
    reuse: IndexReuse,
}

impl<K> EntityRegistry<K>
where
    K: Clone + Eq + Hash,
{
    /// Create an empty registry with the given reuse policy
    pub fn new(reuse: IndexReuse) -> Self {
        EntityRegistry {
            by_key: FxHashMap::default(),
            by_index: BTreeMap::new(),
            next_index: 0,
            free: BTreeSet::new(),
            reuse,
        }
    }

    /// Register `key` and allocate its index
    ///
    /// Returns `None` if the key is already registered.
    pub fn insert(&mut self, key: K) -> Option<usize> {
        if self.by_key.contains_key(&key) {
            return None;
        }
        let index = self.allocate();
        self.by_key.insert(key.clone(), index);
        self.by_index.insert(index, key);
        Some(index)
    }

    fn allocate(&mut self) -> usize {
        if let Some(index) = self.free.pop_first() {
            return index;
        }
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Unregister `key` and release its index immediately
    pub fn remove(&mut self, key: &K) -> Option<usize> {
        let index = self.detach(key)?;
        self.release(index);
        Some(index)
    }

    /// Unregister `key` but keep its index reserved until [`release`](Self::release)
    pub fn detach(&mut self, key: &K) -> Option<usize> {
        let index = self.by_key.remove(key)?;
        self.by_index.remove(&index);
        Some(index)
    }

    /// Make a detached index available again, according to the reuse policy
    ///
    /// Releasing an index that is still mapped or was never allocated is
    /// ignored.
    pub fn release(&mut self, index: usize) {
        if index >= self.next_index || self.by_index.contains_key(&index) {
            return;
        }
        if self.reuse == IndexReuse::LowestFree {
            self.free.insert(index);
        }
    }

    /// Index registered for `key`
    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Key registered at `index`
    pub fn key_of(&self, index: usize) -> Option<&K> {
        self.by_index.get(&index)
    }

    /// Check if `key` is registered
    pub fn contains(&self, key: &K) -> bool {
        self.by_key.contains_key(key)
    }

    /// Registered indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_index.keys().copied()
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// The generation counter: the next index never handed out before
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// The reuse policy
    pub fn reuse(&self) -> IndexReuse {
        self.reuse
    }
}
