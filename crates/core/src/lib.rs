//! Core types for the reactive model
//!
//! This crate defines the value layer everything else builds on:
//! - Path / Segment: immutable addressing into the tree
//! - Value: primitive payloads
//! - Node: persistent, structurally shared tree element (Map or Primitive) with metadata
//! - Navigation: pure `get` / `put` / `delete` / `put_meta` over node graphs
//! - Diff: changed paths between two tree versions
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod error;
pub mod navigate;
pub mod node;
pub mod path;
pub mod value;

pub use diff::{diff, Change, ChangeKind};
pub use error::{ModelError, ModelResult};
pub use navigate::{delete, get, get_value, put, put_meta, try_put, update};
pub use node::{Children, Metadata, Node, NodeKind};
pub use path::{LimitError, Path, PathParseError, Segment, MAX_PATH_LENGTH};
pub use value::Value;
