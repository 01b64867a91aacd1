//! Uniform handle to the current traversal point.

use std::fmt;

use serde::Serialize;
use sluice_ast::{Node, NodeId, StreamElement};

use crate::Representation;

/// Comparable identity of a fragment.
///
/// Stable across the BEFORE and AFTER callbacks of the same traversal point,
/// which is what listeners and mementos correlate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum FragmentId {
    Stream(u64),
    Node(NodeId),
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentId::Stream(id) => write!(f, "stream:{id}"),
            FragmentId::Node(id) => write!(f, "node:{id}"),
        }
    }
}

/// The current traversal point, over either document representation.
///
/// A streaming fragment borrows an element that the driver discards once the
/// callback returns, so it cannot outlive that callback. A tree fragment
/// borrows the document and can be kept as long as the document lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'f> {
    Stream(&'f StreamElement),
    Node(Node<'f>),
}

impl<'f> Fragment<'f> {
    pub fn id(&self) -> FragmentId {
        match self {
            Fragment::Stream(element) => FragmentId::Stream(element.id()),
            Fragment::Node(node) => FragmentId::Node(node.id()),
        }
    }

    /// Returns the element name; `None` for tree text nodes.
    pub fn name(&self) -> Option<&'f str> {
        match *self {
            Fragment::Stream(element) => Some(element.name()),
            Fragment::Node(node) => node.name(),
        }
    }

    pub fn representation(&self) -> Representation {
        match self {
            Fragment::Stream(_) => Representation::Stream,
            Fragment::Node(_) => Representation::Tree,
        }
    }

    /// Returns the wrapped streaming element.
    pub fn as_stream_element(&self) -> Option<&'f StreamElement> {
        match *self {
            Fragment::Stream(element) => Some(element),
            Fragment::Node(_) => None,
        }
    }

    /// Returns the wrapped tree node.
    pub fn as_node(&self) -> Option<Node<'f>> {
        match *self {
            Fragment::Node(node) => Some(node),
            Fragment::Stream(_) => None,
        }
    }
}

impl<'f> From<&'f StreamElement> for Fragment<'f> {
    fn from(element: &'f StreamElement) -> Self {
        Fragment::Stream(element)
    }
}

impl<'f> From<Node<'f>> for Fragment<'f> {
    fn from(node: Node<'f>) -> Self {
        Fragment::Node(node)
    }
}

impl fmt::Display for Fragment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.id()),
            None => write!(f, "#text ({})", self.id()),
        }
    }
}
