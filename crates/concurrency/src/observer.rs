//! Path-scoped change observers
//!
//! Observers register a callback on a [`Path`]. After each commit the
//! registry is handed the diff and calls every observer for which at least
//! one change is relevant (see [`Change::affects`]). Each observer gets one
//! [`ChangeEvent`] per commit carrying only its relevant changes.
//!
//! Callbacks run on the committing thread. The registry never holds its
//! own lock while a callback runs, so callbacks may subscribe and
//! unsubscribe freely.

use parking_lot::RwLock;
use reactive_core::{get, Change, Node, Path};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier returned by a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Raw numeric id
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Callback type stored by the registry
pub type ObserverFn = dyn Fn(&ChangeEvent) + Send + Sync + 'static;

/// What an observer is told about a commit
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Version of the commit
    pub version: u64,
    /// Path the observer registered on
    pub observed: Path,
    /// Changes relevant to `observed`, in path order
    pub changes: Vec<Change>,
    /// Root before the commit
    pub old_root: Node,
    /// Root after the commit
    pub new_root: Node,
}

impl ChangeEvent {
    /// Node at the observed path before the commit
    pub fn old_value(&self) -> Option<&Node> {
        get(&self.old_root, &self.observed)
    }

    /// Node at the observed path after the commit
    pub fn new_value(&self) -> Option<&Node> {
        get(&self.new_root, &self.observed)
    }
}

struct Entry {
    path: Path,
    callback: Arc<ObserverFn>,
}

/// Registry of path observers
pub struct ObserverRegistry {
    next_id: AtomicU64,
    entries: RwLock<BTreeMap<ObserverId, Entry>>,
}

impl ObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ObserverRegistry {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register `callback` for changes affecting `path`
    pub fn subscribe<F>(&self, path: Path, callback: F) -> ObserverId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries.write().insert(
            id,
            Entry {
                path,
                callback: Arc::new(callback),
            },
        );
        id
    }

    /// Remove an observer; returns false if it was not registered
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if no observers are registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Deliver a commit to every affected observer; returns how many were called
    ///
    /// Observers are called in subscription order. An observer removed by
    /// an earlier callback in the same round is skipped.
    pub fn notify(&self, old_root: &Node, new_root: &Node, version: u64, changes: &[Change]) -> usize {
        if changes.is_empty() {
            return 0;
        }

        let targets: Vec<(ObserverId, Path, Arc<ObserverFn>)> = self
            .entries
            .read()
            .iter()
            .map(|(id, e)| (*id, e.path.clone(), e.callback.clone()))
            .collect();

        let mut notified = 0;
        for (id, observed, callback) in targets {
            let relevant: Vec<Change> = changes
                .iter()
                .filter(|c| c.affects(&observed))
                .cloned()
                .collect();
            if relevant.is_empty() || !self.entries.read().contains_key(&id) {
                continue;
            }
            let event = ChangeEvent {
                version,
                observed,
                changes: relevant,
                old_root: old_root.clone(),
                new_root: new_root.clone(),
            };
            callback(&event);
            notified += 1;
        }
        notified
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}
