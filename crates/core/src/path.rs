//! Path addressing for the model tree
//!
//! A [`Path`] is an immutable coordinate into a [`Node`](crate::Node) tree:
//! an ordered sequence of [`Segment`]s. It has no parent/child relation of
//! its own and never points at a node; it only describes where to look.
//!
//! Segments are strings. Integer segments (entity indices and the like) are
//! stored as their decimal representation, so `Path::root().index(3)` and
//! `Path::root().key("3")` are the same path.
//!
//! # Path Syntax
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `` or `/` | Root |
//! | `/a` or `a` | Single segment |
//! | `/a/b/0` | Nested segments |
//!
//! # Examples
//!
//! ```
//! use reactive_core::Path;
//!
//! let editors = Path::root() / "tabs" / "editors";
//! let first = editors.clone().index(0);
//!
//! let parsed: Path = "/tabs/editors/0".parse().unwrap();
//! assert_eq!(parsed, first);
//! assert!(editors.is_ancestor_of(&first));
//! assert_eq!(first.to_string(), "/tabs/editors/0");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Div;
use std::str::FromStr;
use thiserror::Error;

/// Maximum path length in segments
pub const MAX_PATH_LENGTH: usize = 256;

/// Error type for path limit violations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Path exceeds maximum length
    #[error("path length {length} exceeds maximum of {max} segments")]
    PathTooLong {
        /// Actual path length
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
}

/// Error type for path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty segment between two separators
    #[error("empty segment in path at position {0}")]
    EmptySegment(usize),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// One addressing step in a [`Path`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(String);

impl Segment {
    /// Create a segment from a key
    pub fn new(key: impl Into<String>) -> Self {
        Segment(key.into())
    }

    /// The segment as a map key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the segment as an integer index, if it is one
    pub fn as_index(&self) -> Option<usize> {
        if self.0.is_empty() || (self.0.len() > 1 && self.0.starts_with('0')) {
            return None;
        }
        self.0.parse().ok()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment(s.to_string())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment(s)
    }
}

impl From<&String> for Segment {
    fn from(s: &String) -> Self {
        Segment(s.clone())
    }
}

impl From<usize> for Segment {
    fn from(idx: usize) -> Self {
        Segment(idx.to_string())
    }
}

/// An immutable location in the model tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty path, addressing the root node
    pub fn root() -> Self {
        Path {
            segments: Vec::new(),
        }
    }

    /// Create a path from a vector of segments
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Path { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path (empty)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Return a new path with `segment` appended; `self` is left untouched
    pub fn append(&self, segment: impl Into<Segment>) -> Path {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Path { segments }
    }

    /// Append a key segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment(key.into()));
        self
    }

    /// Append an integer segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(Segment::from(idx));
        self
    }

    /// Concatenate two paths
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    /// Get the parent path (None if root)
    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent = self.clone();
            parent.segments.pop();
            Some(parent)
        }
    }

    /// Get the last segment (None if root)
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Check if this path is an ancestor of another (or equal)
    ///
    /// The root path is an ancestor of all paths, and every path is an
    /// ancestor of itself.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Check if this path is a descendant of another (or equal)
    pub fn is_descendant_of(&self, other: &Path) -> bool {
        other.is_ancestor_of(self)
    }

    /// Check if this path is a strict ancestor of another (not equal)
    pub fn is_strict_ancestor_of(&self, other: &Path) -> bool {
        self.segments.len() < other.segments.len() && self.is_ancestor_of(other)
    }

    /// Check if two paths overlap (one is ancestor/descendant of the other)
    pub fn overlaps(&self, other: &Path) -> bool {
        self.is_ancestor_of(other) || self.is_descendant_of(other)
    }

    /// Check if a value observed at this path changes when `write_path` is written
    ///
    /// True when the write lands on this path, inside its subtree, or on one
    /// of its ancestors (which replaces this path's subtree as well).
    pub fn is_affected_by(&self, write_path: &Path) -> bool {
        self.overlaps(write_path)
    }

    /// Strip `prefix` from the front of this path
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if !prefix.is_ancestor_of(self) {
            return None;
        }
        Some(Path::from_segments(
            self.segments[prefix.segments.len()..].to_vec(),
        ))
    }

    /// Validate path length limit
    pub fn validate(&self) -> Result<(), LimitError> {
        self.validate_max(MAX_PATH_LENGTH)
    }

    /// Validate against a tighter, caller-provided limit
    pub fn validate_max(&self, max: usize) -> Result<(), LimitError> {
        let length = self.segments.len();
        if length > max {
            Err(LimitError::PathTooLong { length, max })
        } else {
            Ok(())
        }
    }
}

impl<S: Into<Segment>> Div<S> for Path {
    type Output = Path;

    fn div(mut self, rhs: S) -> Path {
        self.segments.push(rhs.into());
        self
    }
}

impl<S: Into<Segment>> Div<S> for &Path {
    type Output = Path;

    fn div(self, rhs: S) -> Path {
        self.append(rhs)
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Path {
            segments: iter.into_iter().collect(),
        }
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    /// Parse a slash-separated path
    ///
    /// A leading slash is optional; a single trailing slash is ignored.
    /// Segments may contain alphanumerics, `_`, `-`, `.` and `:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix('/').unwrap_or(s);
        let body = body.strip_suffix('/').unwrap_or(body);
        if body.is_empty() {
            return Ok(Path::root());
        }

        let mut segments = Vec::new();
        let mut start = usize::from(s.starts_with('/'));
        for part in body.split('/') {
            if part.is_empty() {
                return Err(PathParseError::EmptySegment(start));
            }
            if let Some((i, c)) = part
                .char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            {
                return Err(PathParseError::UnexpectedChar(c, start + i));
            }
            segments.push(Segment::from(part));
            start += part.len() + 1;
        }

        Ok(Path { segments })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}
