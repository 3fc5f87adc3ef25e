//! Immutable paths locating a node from the root of a tree.
//!
//! Paths are passed by value down the traversal; there is no shared cursor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step from a parent to a child slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// A single-child slot, e.g. `lhs`.
    Field(String),
    /// An element of a list slot, e.g. `args[1]`.
    Index(String, usize),
}

impl PathSegment {
    pub fn field(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }

    pub fn index(name: &str, index: usize) -> Self {
        PathSegment::Index(name.to_string(), index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(name, index) => write!(f, "{}[{}]", name, index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodePath(pub Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path one step deeper; `self` is left untouched.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        NodePath(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        let rendered: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join("."))
    }
}
