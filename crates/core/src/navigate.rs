//! Pure navigation and persistent update over node trees
//!
//! Every function here takes a root and returns a new root; nothing is
//! modified in place. Untouched branches of the old root are shared by
//! the new one.
//!
//! # Primitive-in-the-way policy
//!
//! [`put`] and [`put_meta`] auto-create empty maps for missing
//! intermediate segments. When the walk meets a *primitive* where the path
//! still continues, the primitive (and its metadata) is replaced outright
//! by a fresh empty map. Nothing is merged. [`try_put`] is the strict
//! variant that reports [`ModelError::InvalidPathTransition`] instead.

use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use crate::path::{Path, Segment};
use crate::value::Value;

/// Get the node at `path`
///
/// Returns `None` when a segment is absent or the walk meets a primitive
/// before the path is exhausted. The root path returns `root` itself.
///
/// # Examples
///
/// ```
/// use reactive_core::{get, put, Node, Path};
///
/// let root = put(&Node::map(), &"/a/b".parse().unwrap(), Node::primitive(1i64));
/// assert_eq!(get(&root, &"/a/b".parse().unwrap()), Some(&Node::primitive(1i64)));
/// assert!(get(&root, &"/a/b/c".parse().unwrap()).is_none());
/// assert!(get(&root, &"/missing".parse().unwrap()).is_none());
/// ```
pub fn get<'a>(root: &'a Node, path: &Path) -> Option<&'a Node> {
    let mut current = root;
    for segment in path.segments() {
        current = current.child(segment.as_str())?;
    }
    Some(current)
}

/// Get a primitive value at `path`
pub fn get_value<'a>(root: &'a Node, path: &Path) -> Option<&'a Value> {
    get(root, path)?.as_primitive()
}

/// Set `node` at `path`, returning the new root
///
/// Missing intermediate maps are created; metadata of levels that already
/// existed is kept. Writing at the root path returns `node` itself.
///
/// # Examples
///
/// ```
/// use reactive_core::{get, put, Node, Path};
///
/// let old = Node::map();
/// let path: Path = "/tabs/editors/0".parse().unwrap();
/// let new = put(&old, &path, Node::primitive("main.rs"));
///
/// assert!(old.is_empty()); // old version is untouched
/// assert_eq!(get(&new, &path).and_then(|n| n.as_primitive()).and_then(|v| v.as_str()), Some("main.rs"));
/// ```
pub fn put(root: &Node, path: &Path, node: Node) -> Node {
    modify(root, path.segments(), &mut |_| Some(node.clone()))
}

/// Strict [`put`]: fail instead of replacing a primitive in the way
pub fn try_put(root: &Node, path: &Path, node: Node) -> ModelResult<Node> {
    check_transition(root, path)?;
    Ok(put(root, path, node))
}

/// Remove the entry at `path`, returning the new root and the removed node
///
/// An absent path leaves the root pointer-identical and returns `None`.
/// Removing the root path yields an empty map.
pub fn delete(root: &Node, path: &Path) -> (Node, Option<Node>) {
    if path.is_root() {
        return (Node::map(), Some(root.clone()));
    }
    match get(root, path) {
        None => (root.clone(), None),
        Some(removed) => {
            let removed = removed.clone();
            let new_root = modify(root, path.segments(), &mut |_| None);
            (new_root, Some(removed))
        }
    }
}

/// Set one metadata entry on the node at `path`
///
/// Children and the node's other metadata entries are kept. A missing
/// target is created as an empty map carrying only this entry.
pub fn put_meta(root: &Node, path: &Path, key: &str, value: impl Into<Value>) -> Node {
    let value = value.into();
    modify(root, path.segments(), &mut |existing| {
        Some(
            existing
                .cloned()
                .unwrap_or_default()
                .with_meta(key, value.clone()),
        )
    })
}

/// Rewrite the node at `path` through `f`
///
/// `f` sees the current node (or `None` if absent) and returns the
/// replacement, or `None` to remove the entry. Intermediate levels follow
/// the same policy as [`put`]; removing an absent entry returns `root`
/// pointer-identical, with no intermediate maps created.
pub fn update<F>(root: &Node, path: &Path, f: F) -> Node
where
    F: FnOnce(Option<&Node>) -> Option<Node>,
{
    match f(get(root, path)) {
        Some(replacement) => put(root, path, replacement),
        None => delete(root, path).0,
    }
}

fn modify(
    node: &Node,
    segments: &[Segment],
    f: &mut dyn FnMut(Option<&Node>) -> Option<Node>,
) -> Node {
    let Some((head, rest)) = segments.split_first() else {
        return f(Some(node)).unwrap_or_default();
    };
    let key = head.as_str();

    if rest.is_empty() {
        return match f(node.child(key)) {
            Some(replacement) => node.with_child(key, replacement),
            None => node.without_child(key),
        };
    }

    let next = match node.child(key) {
        Some(child) if child.is_map() => modify(child, rest, f),
        // absent or primitive in the way: descend into a fresh map
        _ => modify(&Node::map(), rest, f),
    };
    node.with_child(key, next)
}

fn check_transition(root: &Node, path: &Path) -> ModelResult<()> {
    let segments = path.segments();
    let mut current = root;
    for (depth, segment) in segments.iter().enumerate() {
        if current.is_primitive() {
            return Err(ModelError::InvalidPathTransition {
                path: Path::from_segments(segments[..depth].to_vec()),
            });
        }
        match current.child(segment.as_str()) {
            Some(child) => current = child,
            None => return Ok(()),
        }
    }
    Ok(())
}
