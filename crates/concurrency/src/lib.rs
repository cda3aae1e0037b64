//! Concurrency layer for the reactive model
//!
//! This crate owns the single mutable cell of the system:
//! - [`ReactiveModel`]: current root, serialized transactions, version counter
//! - [`Snapshot`]: O(1) point-in-time views for readers
//! - [`ObserverRegistry`]: path-scoped change notification after commit
//!
//! Readers never block writers for longer than an `Arc` clone, and never
//! see a partially applied transaction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod model;
pub mod observer;
pub mod snapshot;

pub use model::{Commit, ReactiveModel};
pub use observer::{ChangeEvent, ObserverFn, ObserverId, ObserverRegistry};
pub use snapshot::Snapshot;
