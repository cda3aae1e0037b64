//! Point-in-time views of the model
//!
//! A [`Snapshot`] pairs a root with the version it was committed at.
//! Because nodes are immutable and shared, taking a snapshot is O(1) and
//! it stays valid and unchanged no matter how many transactions commit
//! afterwards.
//!
//! # Guarantees
//!
//! - A snapshot always shows one complete committed root
//! - It never shows a partially applied transaction
//! - Repeated reads through the same snapshot return the same nodes

use reactive_core::{get, Node, Path};

/// One committed version of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    version: u64,
    root: Node,
}

impl Snapshot {
    /// Create a snapshot of `root` at `version`
    pub fn new(version: u64, root: Node) -> Self {
        Snapshot { version, root }
    }

    /// Version of the commit that produced this root
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Read the node at `path`
    pub fn get(&self, path: &Path) -> Option<&Node> {
        get(&self.root, path)
    }

    /// Take ownership of the root
    pub fn into_root(self) -> Node {
        self.root
    }
}
