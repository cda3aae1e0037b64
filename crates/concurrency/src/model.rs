//! The transaction engine
//!
//! [`ReactiveModel`] owns exactly one current root at any instant and no
//! history. Readers clone the current [`Snapshot`] (an `Arc` bump under a
//! read lock held for nanoseconds); writers submit a pure transform.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. Reject if this thread already holds the writer slot (ReentrantTransaction)
//! 2. Acquire the writer slot (other threads wait here, in arrival order)
//! 3. Read the current snapshot
//! 4. Run the transform on its root
//! 5. IF the transform fails: return its error, root untouched
//! 6. Diff old and new root; IF empty: no-op, version unchanged
//! 7. Install the new root with version + 1 (visibility point)
//! 8. Notify affected observers (deferred phase, still holding the slot)
//! 9. Release the slot and return the Commit
//! ```
//!
//! Observers therefore run after the new root is visible to every reader,
//! in commit order, and before `transaction` returns. A transaction started
//! from inside a transform or an observer on the same thread fails loudly
//! instead of deadlocking.

use crate::observer::{ChangeEvent, ObserverId, ObserverRegistry};
use crate::snapshot::Snapshot;
use parking_lot::{Mutex, RwLock};
use reactive_core::{diff, get, Change, ModelError, ModelResult, Node, Path};
use reactive_lifetime::{Lifetime, LifetimeResult};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Result of a completed transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Version after the transaction (unchanged for a no-op)
    pub version: u64,
    /// Changes between the old and the new root
    pub changes: Vec<Change>,
    /// Number of observers notified
    pub notified: usize,
}

impl Commit {
    fn noop(version: u64) -> Self {
        Commit {
            version,
            changes: Vec::new(),
            notified: 0,
        }
    }

    /// Check if the transaction left the tree unchanged
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Clears the writer-thread marker even if the transform panics
struct WriterMark<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> WriterMark<'a> {
    fn claim(slot: &'a Mutex<Option<ThreadId>>, me: ThreadId) -> Self {
        *slot.lock() = Some(me);
        WriterMark(slot)
    }
}

impl Drop for WriterMark<'_> {
    fn drop(&mut self) {
        *self.0.lock() = None;
    }
}

/// Owner of the current tree root
pub struct ReactiveModel {
    current: RwLock<Snapshot>,
    writer: Mutex<()>,
    writer_thread: Mutex<Option<ThreadId>>,
    observers: Arc<ObserverRegistry>,
}

impl ReactiveModel {
    /// Create a model whose root is an empty map at version 0
    pub fn new() -> Self {
        Self::with_root(Node::map())
    }

    /// Create a model with an initial root at version 0
    pub fn with_root(root: Node) -> Self {
        ReactiveModel {
            current: RwLock::new(Snapshot::new(0, root)),
            writer: Mutex::new(()),
            writer_thread: Mutex::new(None),
            observers: Arc::new(ObserverRegistry::new()),
        }
    }

    /// The current root
    pub fn root(&self) -> Node {
        self.current.read().root().clone()
    }

    /// The current root together with its version
    pub fn snapshot(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// Current version (number of non-empty commits so far)
    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    /// Read the node at `path` in the current root
    pub fn get(&self, path: &Path) -> Option<Node> {
        let snapshot = self.snapshot();
        get(snapshot.root(), path).cloned()
    }

    /// Atomically replace the root with `f(root)`
    ///
    /// # Errors
    ///
    /// - whatever `f` returns; the root is left exactly as it was
    /// - [`ModelError::ReentrantTransaction`] when called from inside a
    ///   transform or observer running on this thread
    ///
    /// # Example
    ///
    /// ```
    /// use reactive_concurrency::ReactiveModel;
    /// use reactive_core::{put, Node, Path};
    ///
    /// let model = ReactiveModel::new();
    /// let path: Path = "/a/b".parse().unwrap();
    /// let commit = model
    ///     .transaction(|root| Ok(put(root, &path, Node::primitive(1i64))))
    ///     .unwrap();
    /// assert_eq!(commit.version, 1);
    /// assert_eq!(model.get(&path), Some(Node::primitive(1i64)));
    /// ```
    pub fn transaction<F>(&self, f: F) -> ModelResult<Commit>
    where
        F: FnOnce(&Node) -> ModelResult<Node>,
    {
        self.transaction_with(|root| f(root).map(|new_root| (new_root, ())))
            .map(|((), commit)| commit)
    }

    /// Like [`transaction`](Self::transaction), also returning a value computed by `f`
    pub fn transaction_with<F, T>(&self, f: F) -> ModelResult<(T, Commit)>
    where
        F: FnOnce(&Node) -> ModelResult<(Node, T)>,
    {
        let me = thread::current().id();
        if *self.writer_thread.lock() == Some(me) {
            tracing::error!(
                target: "reactive::model",
                "transaction started from inside another transaction on the same thread"
            );
            return Err(ModelError::ReentrantTransaction);
        }

        let _slot = self.writer.lock();
        let _mark = WriterMark::claim(&self.writer_thread, me);

        let base = self.snapshot();
        let (new_root, value) = match f(base.root()) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    target: "reactive::model",
                    version = base.version(),
                    error = %e,
                    "transaction aborted, root unchanged"
                );
                return Err(e);
            }
        };

        let changes = diff(base.root(), &new_root);
        if changes.is_empty() {
            tracing::trace!(
                target: "reactive::model",
                version = base.version(),
                "transaction produced no changes"
            );
            return Ok((value, Commit::noop(base.version())));
        }

        let version = base.version() + 1;
        *self.current.write() = Snapshot::new(version, new_root.clone());

        tracing::debug!(
            target: "reactive::model",
            version,
            changes = changes.len(),
            "transaction committed"
        );

        let notified = self
            .observers
            .notify(base.root(), &new_root, version, &changes);

        Ok((
            value,
            Commit {
                version,
                changes,
                notified,
            },
        ))
    }

    /// Observe changes affecting `path`
    pub fn subscribe<F>(&self, path: Path, callback: F) -> ObserverId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(path, callback)
    }

    /// Stop observing; returns false if `id` was not registered
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Observe `path` for as long as `lifetime` is alive
    ///
    /// The subscription is removed when `lifetime` terminates. Fails if the
    /// lifetime is already terminated, in which case nothing is registered.
    pub fn observe<F>(&self, lifetime: &Lifetime, path: Path, callback: F) -> LifetimeResult<ObserverId>
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.observers.subscribe(path, callback);
        let registry = Arc::downgrade(&self.observers);
        let registered = lifetime.try_on_termination(move || {
            if let Some(registry) = registry.upgrade() {
                registry.unsubscribe(id);
            }
        });
        if let Err(e) = registered {
            self.observers.unsubscribe(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl Default for ReactiveModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReactiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveModel")
            .field("version", &self.version())
            .field("observers", &self.observers.len())
            .finish()
    }
}
