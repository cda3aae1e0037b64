//! Persistent tree nodes
//!
//! A [`Node`] is an immutable value: a cheap-to-clone handle onto shared
//! data. Every "mutation" builds a new node that reuses the untouched
//! children of the old one, so older versions stay valid for anyone still
//! holding them.
//!
//! Each node carries a [`Metadata`] mapping next to its children. Metadata
//! is part of the node's value (it participates in equality) and is kept
//! by the update primitives unless an operation explicitly targets it.
//! Host objects with identity do not belong here; see the runtime's host
//! side table instead.
//!
//! # Known Limitations
//!
//! Map children live in a `BTreeMap`, so producing a new version of a map
//! copies its key vector (O(width)) while every child subtree is shared.

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Metadata attached to a node, orthogonal to its children
pub type Metadata = BTreeMap<String, Value>;

/// Children of a map node, ordered by key
pub type Children = BTreeMap<String, Node>;

/// The two node variants
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Keyed children
    Map(Children),
    /// A leaf wrapping one immutable value
    Primitive(Value),
}

#[derive(Debug, PartialEq)]
struct NodeData {
    kind: NodeKind,
    metadata: Metadata,
}

/// Immutable, structurally shared tree element
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    fn from_parts(kind: NodeKind, metadata: Metadata) -> Self {
        Node(Arc::new(NodeData { kind, metadata }))
    }

    /// An empty map node without metadata
    pub fn map() -> Self {
        Self::from_parts(NodeKind::Map(Children::new()), Metadata::new())
    }

    /// A map node built from `(key, child)` pairs
    pub fn map_from<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        let children = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::from_parts(NodeKind::Map(children), Metadata::new())
    }

    /// A map node with explicit children and metadata
    pub fn map_with(children: Children, metadata: Metadata) -> Self {
        Self::from_parts(NodeKind::Map(children), metadata)
    }

    /// A primitive leaf
    pub fn primitive(value: impl Into<Value>) -> Self {
        Self::from_parts(NodeKind::Primitive(value.into()), Metadata::new())
    }

    /// The node variant
    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Check if this is a map node
    pub fn is_map(&self) -> bool {
        matches!(self.0.kind, NodeKind::Map(_))
    }

    /// Check if this is a primitive node
    pub fn is_primitive(&self) -> bool {
        matches!(self.0.kind, NodeKind::Primitive(_))
    }

    /// Children if this is a map node
    pub fn children(&self) -> Option<&Children> {
        match &self.0.kind {
            NodeKind::Map(children) => Some(children),
            NodeKind::Primitive(_) => None,
        }
    }

    /// Value if this is a primitive node
    pub fn as_primitive(&self) -> Option<&Value> {
        match &self.0.kind {
            NodeKind::Primitive(v) => Some(v),
            NodeKind::Map(_) => None,
        }
    }

    /// Direct child by key; `None` for primitives and absent keys
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children()?.get(key)
    }

    /// Check if a map node has a child at `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.child(key).is_some()
    }

    /// Keys of a map node in ascending order (empty for primitives)
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.children()
            .into_iter()
            .flat_map(|children| children.keys().map(String::as_str))
    }

    /// Number of children (0 for primitives)
    pub fn len(&self) -> usize {
        self.children().map_or(0, |c| c.len())
    }

    /// Check if this node has no children
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata mapping of this node
    pub fn metadata(&self) -> &Metadata {
        &self.0.metadata
    }

    /// Fetch one metadata entry
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.0.metadata.get(key)
    }

    /// A copy of this node with one metadata entry set
    pub fn with_meta(&self, key: impl Into<String>, value: impl Into<Value>) -> Node {
        let mut metadata = self.0.metadata.clone();
        metadata.insert(key.into(), value.into());
        Self::from_parts(self.0.kind.clone(), metadata)
    }

    /// A copy of this node with one metadata entry removed
    pub fn without_meta(&self, key: &str) -> Node {
        if !self.0.metadata.contains_key(key) {
            return self.clone();
        }
        let mut metadata = self.0.metadata.clone();
        metadata.remove(key);
        Self::from_parts(self.0.kind.clone(), metadata)
    }

    /// A copy of this node with its metadata replaced wholesale
    pub fn with_metadata(&self, metadata: Metadata) -> Node {
        Self::from_parts(self.0.kind.clone(), metadata)
    }

    /// A copy of this map node with `key` set to `child`
    ///
    /// Metadata is kept. A primitive is replaced by a fresh, metadata-free
    /// map holding only the new child.
    pub fn with_child(&self, key: impl Into<String>, child: Node) -> Node {
        match &self.0.kind {
            NodeKind::Map(children) => {
                let mut children = children.clone();
                children.insert(key.into(), child);
                Self::from_parts(NodeKind::Map(children), self.0.metadata.clone())
            }
            NodeKind::Primitive(_) => Node::map_from([(key.into(), child)]),
        }
    }

    /// A copy of this map node without `key`; unchanged handle if absent
    pub fn without_child(&self, key: &str) -> Node {
        match &self.0.kind {
            NodeKind::Map(children) if children.contains_key(key) => {
                let mut children = children.clone();
                children.remove(key);
                Self::from_parts(NodeKind::Map(children), self.0.metadata.clone())
            }
            _ => self.clone(),
        }
    }

    /// Check whether two handles share the same underlying node
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Nesting depth (0 for a primitive or an empty map)
    pub fn depth(&self) -> usize {
        match &self.0.kind {
            NodeKind::Primitive(_) => 0,
            NodeKind::Map(children) => children
                .values()
                .map(|c| c.depth() + 1)
                .max()
                .unwrap_or(0),
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::map()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::ptr_eq(self, other) || self.0 == other.0
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            NodeKind::Primitive(v) if self.0.metadata.is_empty() => {
                write!(f, "Primitive({:?})", v)
            }
            NodeKind::Primitive(v) => f
                .debug_struct("Primitive")
                .field("value", v)
                .field("meta", &self.0.metadata)
                .finish(),
            NodeKind::Map(children) if self.0.metadata.is_empty() => {
                f.debug_map().entries(children.iter()).finish()
            }
            NodeKind::Map(children) => f
                .debug_struct("Map")
                .field("children", children)
                .field("meta", &self.0.metadata)
                .finish(),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::primitive(value)
    }
}
