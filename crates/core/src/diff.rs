//! Structural diff between two tree versions
//!
//! The diff walks both roots in lockstep and skips any pair of subtrees
//! that share the same allocation, so the cost of diffing two versions
//! produced by [`put`](crate::put) is proportional to the touched spine,
//! not the tree size.

use crate::node::{Node, NodeKind};
use crate::path::Path;
use std::collections::BTreeSet;
use std::fmt;

/// How the entry at a path changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Entry did not exist before
    Added,
    /// Entry no longer exists
    Removed,
    /// Entry was replaced by a different value (kind change or primitive change)
    Replaced,
    /// Only the node's metadata differs; children are compared separately
    MetadataChanged,
}

/// A single changed location between two roots
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Change {
    /// Location of the change
    pub path: Path,
    /// What happened there
    pub kind: ChangeKind,
}

impl Change {
    /// Whether an observer registered at `observed` should hear about this change
    ///
    /// Observers see changes at their own path and anywhere below it.
    /// Value changes also reach observers registered below the changed
    /// path, since their subtree was replaced; metadata-only changes do not.
    pub fn affects(&self, observed: &Path) -> bool {
        match self.kind {
            ChangeKind::MetadataChanged => observed.is_ancestor_of(&self.path),
            _ => observed.is_affected_by(&self.path),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            ChangeKind::Added => "ADD",
            ChangeKind::Removed => "REMOVE",
            ChangeKind::Replaced => "REPLACE",
            ChangeKind::MetadataChanged => "META",
        };
        write!(f, "{} {}", tag, self.path)
    }
}

/// Compute the changes that turn `old` into `new`
///
/// Changes are reported at the shallowest level where the two trees
/// diverge in kind or value; a map whose children differ is not itself
/// reported unless its metadata changed too. Output is in path order.
pub fn diff(old: &Node, new: &Node) -> Vec<Change> {
    let mut out = Vec::new();
    diff_into(old, new, &Path::root(), &mut out);
    out
}

fn diff_into(old: &Node, new: &Node, at: &Path, out: &mut Vec<Change>) {
    if Node::ptr_eq(old, new) {
        return;
    }
    match (old.kind(), new.kind()) {
        (NodeKind::Map(old_children), NodeKind::Map(new_children)) => {
            if old.metadata() != new.metadata() {
                out.push(Change {
                    path: at.clone(),
                    kind: ChangeKind::MetadataChanged,
                });
            }
            let keys: BTreeSet<&String> = old_children.keys().chain(new_children.keys()).collect();
            for key in keys {
                let child_path = at.append(key);
                match (old_children.get(key), new_children.get(key)) {
                    (Some(o), Some(n)) => diff_into(o, n, &child_path, out),
                    (Some(_), None) => out.push(Change {
                        path: child_path,
                        kind: ChangeKind::Removed,
                    }),
                    (None, Some(_)) => out.push(Change {
                        path: child_path,
                        kind: ChangeKind::Added,
                    }),
                    (None, None) => {}
                }
            }
        }
        (NodeKind::Primitive(a), NodeKind::Primitive(b)) => {
            if a != b {
                out.push(Change {
                    path: at.clone(),
                    kind: ChangeKind::Replaced,
                });
            } else if old.metadata() != new.metadata() {
                out.push(Change {
                    path: at.clone(),
                    kind: ChangeKind::MetadataChanged,
                });
            }
        }
        _ => out.push(Change {
            path: at.clone(),
            kind: ChangeKind::Replaced,
        }),
    }
}
