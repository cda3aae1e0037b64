//! Host-object side table
//!
//! Maps a tree location plus a string key to an opaque host object (a view
//! controller, an editor handle, anything the application wants to find
//! again from a path).
//!
//! # Not part of the tree
//!
//! Entries here are NOT node metadata. They are never copied by `put`,
//! never compared by `diff`, never seen by observers, and never survive
//! the runtime that owns the table. Two trees that are equal as values
//! may have completely different host objects attached, and a snapshot
//! taken before an attach does not "lose" anything.
//!
//! # Concurrency
//!
//! Backed by `DashMap`: lookups do not contend with transactions and only
//! lock the shard holding the entry.

use dashmap::DashMap;
use reactive_core::Path;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased host object
pub type HostObject = Arc<dyn Any + Send + Sync>;

/// Runtime-owned table of host objects keyed by `(Path, key)`
#[derive(Default)]
pub struct HostTable {
    entries: DashMap<(Path, String), HostObject>,
}

impl HostTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `host` at `(path, key)`, returning the object it replaced
    pub fn insert<T>(&self, path: Path, key: impl Into<String>, host: T) -> Option<HostObject>
    where
        T: Any + Send + Sync,
    {
        self.insert_arc(path, key, Arc::new(host))
    }

    /// Attach an already shared host object
    pub fn insert_arc(&self, path: Path, key: impl Into<String>, host: HostObject) -> Option<HostObject> {
        self.entries.insert((path, key.into()), host)
    }

    /// Fetch the object at `(path, key)` if it exists and is a `T`
    pub fn get<T>(&self, path: &Path, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self.get_any(path, key)?;
        entry.downcast::<T>().ok()
    }

    /// Fetch the object at `(path, key)` without a type check
    pub fn get_any(&self, path: &Path, key: &str) -> Option<HostObject> {
        self.entries
            .get(&(path.clone(), key.to_string()))
            .map(|e| Arc::clone(e.value()))
    }

    /// Check if an object is attached at `(path, key)`
    pub fn contains(&self, path: &Path, key: &str) -> bool {
        self.entries.contains_key(&(path.clone(), key.to_string()))
    }

    /// Detach and return the object at `(path, key)`
    pub fn remove(&self, path: &Path, key: &str) -> Option<HostObject> {
        self.entries
            .remove(&(path.clone(), key.to_string()))
            .map(|(_, v)| v)
    }

    /// Detach everything attached at `path` or below it; returns how many
    pub fn remove_subtree(&self, path: &Path) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(at, _), _| !path.is_ancestor_of(at));
        before.saturating_sub(self.entries.len())
    }

    /// Number of attached objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is attached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HostTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}
