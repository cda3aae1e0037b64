//! Runtime layer for the reactive model
//!
//! This crate ties the lower layers together for applications:
//! - Runtime: owns the model, the host side table and the root lifetime
//! - Entity groups: addressable siblings with exclusive active selection
//! - Entity registry: key <-> index mapping with an index reuse policy
//! - Host table: host objects attached by path, outside the tree
//! - Configuration via `reactive.toml`
//!
//! The engine is the only component that knows about:
//! - Entity layout in the tree (`<group>/entities/<index>/active`)
//! - Binding entity lifetimes to tree removal

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod group;
pub mod host;
pub mod registry;
pub mod runtime;

pub use config::{ActivationOrder, IndexReuse, ModelConfig, CONFIG_FILE_NAME};
pub use error::{EngineError, EngineResult};
pub use group::{EntityGroup, EntityHandle, ACTIVE_KEY, ENTITIES_KEY, GROUP_KIND, HOST_KEY, KIND_META};
pub use host::{HostObject, HostTable};
pub use registry::EntityRegistry;
pub use runtime::Runtime;
