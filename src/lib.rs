//! reactive-model - Persistent path-addressed state with transactional updates
//!
//! A tree of immutable nodes addressed by [`Path`], updated by submitting
//! pure transforms to [`ReactiveModel::transaction`], with observers
//! notified of the paths each commit touched. Resources tied to tree
//! entities are scoped by [`Lifetime`]s.
//!
//! # Quick Start
//!
//! ```
//! use reactive_model::{put, Node, Path, Runtime};
//!
//! let runtime = Runtime::default();
//! let title: Path = "/doc/title".parse().unwrap();
//!
//! runtime
//!     .model()
//!     .transaction(|root| Ok(put(root, &title, Node::primitive("draft"))))
//!     .unwrap();
//!
//! let tabs = runtime.group::<&str>("/tabs".parse().unwrap()).unwrap();
//! tabs.add("main.rs", Node::map(), true).unwrap();
//! tabs.add("lib.rs", Node::map(), false).unwrap();
//! assert_eq!(tabs.remove(&"main.rs").unwrap(), Some(1));
//! ```
//!
//! # Architecture
//!
//! - `reactive-core`: paths, nodes, pure navigation/update, diff
//! - `reactive-lifetime`: cancellation scope tree
//! - `reactive-concurrency`: the transaction engine and observers
//! - `reactive-engine`: runtime, entity groups, host side table, config
//!
//! This crate only re-exports their public API.

pub use reactive_concurrency::{
    ChangeEvent, Commit, ObserverFn, ObserverId, ObserverRegistry, ReactiveModel, Snapshot,
};
pub use reactive_core::{
    delete, diff, get, get_value, put, put_meta, try_put, update, Change, ChangeKind, Children,
    LimitError, Metadata, ModelError, ModelResult, Node, NodeKind, Path, PathParseError, Segment,
    Value, MAX_PATH_LENGTH,
};
pub use reactive_engine::{
    ActivationOrder, EngineError, EngineResult, EntityGroup, EntityHandle, EntityRegistry,
    HostObject, HostTable, IndexReuse, ModelConfig, Runtime, CONFIG_FILE_NAME,
};
pub use reactive_lifetime::{Lifetime, LifetimeError, LifetimeResult};
