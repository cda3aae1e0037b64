//! Hierarchical resource lifetimes
//!
//! A [`Lifetime`] is a cancellation scope. Scopes form a tree: every
//! lifetime created with [`Lifetime::create`] is bounded by its parent and
//! terminates no later than it. Cleanup is attached with
//! [`Lifetime::on_termination`] and runs exactly once.
//!
//! ## Termination order
//!
//! `terminate()` is idempotent. The first call:
//!
//! 1. flips the lifetime out of the alive state (before anything else runs,
//!    so re-entrant calls from callbacks are no-ops),
//! 2. terminates every live child, newest first, each child running its own
//!    callbacks before returning,
//! 3. runs this lifetime's callbacks, most recently registered first,
//! 4. marks itself terminated and detaches from its parent.
//!
//! A child can still be mid-termination when its parent reaches step 3:
//! a child callback may terminate an ancestor, or another thread may be
//! terminating the child. The parent then holds its callbacks back, and
//! the child that detaches last runs steps 3 and 4 for it. Either way no
//! parent callback runs before every child callback has finished.
//!
//! Callbacks run without any internal lock held, so they may create,
//! terminate or register on any lifetime, including ancestors.
//!
//! Dropping a `Lifetime` handle does not terminate it; handles are cheap
//! clones of one shared scope.
//!
//! ## Example
//!
//! ```
//! use reactive_lifetime::Lifetime;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let root = Lifetime::new();
//! let child = Lifetime::create(&root).unwrap();
//!
//! let cleaned = Arc::new(AtomicUsize::new(0));
//! let c = cleaned.clone();
//! child.on_termination(move || {
//!     c.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! root.terminate();
//! root.terminate();
//! assert!(child.is_terminated());
//! assert_eq!(cleaned.load(Ordering::SeqCst), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Result type alias for lifetime operations
pub type LifetimeResult<T> = std::result::Result<T, LifetimeError>;

/// Errors raised when operating on a lifetime
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifetimeError {
    /// The lifetime (or the parent being extended) is no longer alive
    #[error("lifetime {id} is already terminated")]
    AlreadyTerminated {
        /// Id of the terminated lifetime
        id: u64,
    },
}

type Callback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Alive,
    Terminating,
    Terminated,
}

struct State {
    phase: Phase,
    children: Vec<Arc<Inner>>,
    callbacks: Vec<Callback>,
    /// Own callbacks are held back until the remaining children detach
    awaiting_children: bool,
}

struct Inner {
    id: u64,
    parent: Option<Weak<Inner>>,
    state: Mutex<State>,
}

static NEXT_LIFETIME_ID: AtomicU64 = AtomicU64::new(1);

impl Inner {
    fn new(parent: Option<Weak<Inner>>) -> Arc<Inner> {
        Arc::new(Inner {
            id: NEXT_LIFETIME_ID.fetch_add(1, Ordering::Relaxed),
            parent,
            state: Mutex::new(State {
                phase: Phase::Alive,
                children: Vec::new(),
                callbacks: Vec::new(),
                awaiting_children: false,
            }),
        })
    }

    fn terminate(self: &Arc<Self>) -> bool {
        let children = {
            let mut state = self.state.lock();
            if state.phase != Phase::Alive {
                return false;
            }
            state.phase = Phase::Terminating;
            state.children.clone()
        };

        tracing::trace!(
            target: "reactive::lifetime",
            id = self.id,
            children = children.len(),
            "terminating lifetime"
        );

        // children detach themselves from `state.children` once finished
        for child in children.iter().rev() {
            child.terminate();
        }

        let ready = {
            let mut state = self.state.lock();
            if state.children.is_empty() {
                true
            } else {
                state.awaiting_children = true;
                false
            }
        };
        if ready {
            self.finish();
        } else {
            tracing::trace!(
                target: "reactive::lifetime",
                id = self.id,
                "waiting for children still terminating"
            );
        }
        true
    }

    /// Run own callbacks, mark terminated, detach from the parent
    fn finish(self: &Arc<Self>) {
        let callbacks = std::mem::take(&mut self.state.lock().callbacks);
        for callback in callbacks.into_iter().rev() {
            callback();
        }

        self.state.lock().phase = Phase::Terminated;

        let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) else {
            return;
        };
        let finish_parent = {
            let mut state = parent.state.lock();
            state.children.retain(|c| !Arc::ptr_eq(c, self));
            if state.awaiting_children && state.children.is_empty() {
                state.awaiting_children = false;
                true
            } else {
                false
            }
        };
        if finish_parent {
            parent.finish();
        }
    }
}

/// A node in the cancellation-scope tree
#[derive(Clone)]
pub struct Lifetime {
    inner: Arc<Inner>,
}

impl Lifetime {
    /// Create a new top-level lifetime
    pub fn new() -> Self {
        Lifetime {
            inner: Inner::new(None),
        }
    }

    /// Create a child scope bounded by `parent`
    ///
    /// Fails with [`LifetimeError::AlreadyTerminated`] if `parent` is no
    /// longer alive.
    pub fn create(parent: &Lifetime) -> LifetimeResult<Lifetime> {
        let child = Inner::new(Some(Arc::downgrade(&parent.inner)));
        let mut state = parent.inner.state.lock();
        if state.phase != Phase::Alive {
            return Err(LifetimeError::AlreadyTerminated {
                id: parent.inner.id,
            });
        }
        state.children.push(child.clone());
        Ok(Lifetime { inner: child })
    }

    /// Unique id of this lifetime
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Register a cleanup callback
    ///
    /// If this lifetime is already terminated (or terminating), `callback`
    /// runs immediately on the calling thread.
    pub fn on_termination<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(callback) = self.register(Box::new(callback)) {
            callback();
        }
    }

    /// Register a cleanup callback, failing if this lifetime is no longer alive
    ///
    /// Use this when attaching a resource that must not outlive the scope:
    /// a terminated scope is a programmer error, reported to the caller.
    pub fn try_on_termination<F>(&self, callback: F) -> LifetimeResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.register(Box::new(callback))
            .map_err(|_| LifetimeError::AlreadyTerminated { id: self.inner.id })
    }

    fn register(&self, callback: Callback) -> Result<(), Callback> {
        let mut state = self.inner.state.lock();
        if state.phase != Phase::Alive {
            return Err(callback);
        }
        state.callbacks.push(callback);
        Ok(())
    }

    /// Terminate this lifetime and everything nested in it
    ///
    /// Returns `true` for the call that actually started termination and
    /// `false` for every later (or concurrent, re-entrant) call. If a child
    /// is still terminating elsewhere, this lifetime's own callbacks run
    /// when that child finishes, on the thread finishing it.
    pub fn terminate(&self) -> bool {
        self.inner.terminate()
    }

    /// Check if termination has started or finished
    pub fn is_terminated(&self) -> bool {
        self.inner.state.lock().phase != Phase::Alive
    }

    /// Check if this lifetime is still alive
    pub fn is_alive(&self) -> bool {
        !self.is_terminated()
    }

    /// Number of children not yet fully terminated
    pub fn child_count(&self) -> usize {
        self.inner.state.lock().children.len()
    }

    /// Number of pending callbacks
    pub fn callback_count(&self) -> usize {
        self.inner.state.lock().callbacks.len()
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Lifetime {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Lifetime {}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Lifetime")
            .field("id", &self.inner.id)
            .field("phase", &state.phase)
            .field("children", &state.children.len())
            .field("callbacks", &state.callbacks.len())
            .finish()
    }
}
