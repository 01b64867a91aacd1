//! Tree document model.
//!
//! Nodes live in a single `Vec` owned by the [`Document`]; a [`Node`] is a
//! copyable `(document, id)` handle, so it can be kept for as long as the
//! document is borrowed.

use std::fmt;

use serde::Serialize;

use crate::{Attribute, DocumentError, StreamEvent, StreamText, TextKind};

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    /// The document element.
    pub const ROOT: NodeId = NodeId(0);

    /// Returns the arena index of this node.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text {
        text: String,
        kind: TextKind,
    },
}

#[derive(Debug, Clone)]
struct NodeEntry {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory document tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
}

impl Document {
    /// Creates a document containing only its document element.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeEntry {
                kind: NodeKind::Element {
                    name: root_name.into(),
                    attributes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Returns the document element.
    pub fn root(&self) -> Node<'_> {
        Node {
            document: self,
            id: NodeId::ROOT,
        }
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { document: self, id })
    }

    /// Returns the total number of nodes, text nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a child element to `parent` and returns its id.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
    ) -> Result<NodeId, DocumentError> {
        self.append(
            parent,
            NodeKind::Element {
                name: name.into(),
                attributes: Vec::new(),
            },
        )
    }

    /// Appends a text child to `parent` and returns its id.
    pub fn append_text(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, DocumentError> {
        self.append(
            parent,
            NodeKind::Text {
                text: text.into(),
                kind: TextKind::Text,
            },
        )
    }

    /// Appends character data of an explicit kind to `parent`.
    pub fn append_character_data(
        &mut self,
        parent: NodeId,
        text: StreamText,
    ) -> Result<NodeId, DocumentError> {
        self.append(
            parent,
            NodeKind::Text {
                text: text.text,
                kind: text.kind,
            },
        )
    }

    /// Sets (or replaces) an attribute on an element.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let entry = self
            .nodes
            .get_mut(element.index())
            .ok_or(DocumentError::UnknownNode(element))?;
        let NodeKind::Element { attributes, .. } = &mut entry.kind else {
            return Err(DocumentError::NotAnElement(element));
        };

        let name = name.into();
        let value = value.into();
        match attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => attributes.push(Attribute { name, value }),
        }
        Ok(())
    }

    /// Replays the document as a streaming event sequence.
    pub fn events(&self) -> Events<'_> {
        Events {
            document: self,
            stack: Vec::new(),
            started: false,
        }
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, DocumentError> {
        let parent_entry = self
            .nodes
            .get(parent.index())
            .ok_or(DocumentError::UnknownNode(parent))?;
        if !matches!(parent_entry.kind, NodeKind::Element { .. }) {
            return Err(DocumentError::NotAnElement(parent));
        }

        let index = u32::try_from(self.nodes.len())
            .map_err(|_| DocumentError::invalid("document exceeds u32::MAX nodes"))?;
        let id = NodeId(index);
        self.nodes.push(NodeEntry {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    fn entry(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.index()]
    }
}

/// A handle to one node of a [`Document`].
#[derive(Clone, Copy)]
pub struct Node<'d> {
    document: &'d Document,
    id: NodeId,
}

impl<'d> Node<'d> {
    /// Returns the id of this node.
    #[inline]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Returns the owning document.
    #[inline]
    pub fn document(self) -> &'d Document {
        self.document
    }

    /// Returns the node payload.
    pub fn kind(self) -> &'d NodeKind {
        &self.document.entry(self.id).kind
    }

    pub fn is_element(self) -> bool {
        matches!(self.kind(), NodeKind::Element { .. })
    }

    pub fn is_text(self) -> bool {
        matches!(self.kind(), NodeKind::Text { .. })
    }

    /// Returns the element name, or `None` for text nodes.
    pub fn name(self) -> Option<&'d str> {
        match self.kind() {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text { .. } => None,
        }
    }

    /// Returns the attributes of an element (empty for text nodes).
    pub fn attributes(self) -> &'d [Attribute] {
        match self.kind() {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Text { .. } => &[],
        }
    }

    /// Looks up an attribute value by name.
    pub fn attribute(self, name: &str) -> Option<&'d str> {
        self.attributes()
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Returns the character data of a text node.
    pub fn text(self) -> Option<&'d str> {
        match self.kind() {
            NodeKind::Text { text, .. } => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Returns the parent element, or `None` for the document element.
    pub fn parent(self) -> Option<Node<'d>> {
        self.document.entry(self.id).parent.map(|id| Node {
            document: self.document,
            id,
        })
    }

    /// Iterates over the direct children in document order.
    pub fn children(self) -> impl Iterator<Item = Node<'d>> {
        let document = self.document;
        document
            .entry(self.id)
            .children
            .iter()
            .map(move |&id| Node { document, id })
    }

    /// Iterates over the direct element children in document order.
    pub fn child_elements(self) -> impl Iterator<Item = Node<'d>> {
        self.children().filter(|child| child.is_element())
    }

    /// Returns the nesting depth (0 for the document element).
    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(node) = current {
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// Concatenates the text of all descendant text nodes.
    pub fn text_content(self) -> String {
        let mut text = String::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(value) = node.text() {
                text.push_str(value);
            }
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        text
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            NodeKind::Element { name, .. } => write!(f, "Element({} {})", self.id, name),
            NodeKind::Text { text, .. } => write!(f, "Text({} {:?})", self.id, text),
        }
    }
}

/// Iterator returned by [`Document::events`].
pub struct Events<'d> {
    document: &'d Document,
    /// Open elements with the index of the next child to emit.
    stack: Vec<(NodeId, usize)>,
    started: bool,
}

impl Events<'_> {
    fn start_event(&self, id: NodeId) -> StreamEvent {
        match &self.document.entry(id).kind {
            NodeKind::Element { name, attributes } => StreamEvent::Start {
                name: name.clone(),
                attributes: attributes.clone(),
            },
            NodeKind::Text { text, kind } => StreamEvent::Text(StreamText {
                text: text.clone(),
                kind: *kind,
            }),
        }
    }
}

impl Iterator for Events<'_> {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            self.stack.push((NodeId::ROOT, 0));
            return Some(self.start_event(NodeId::ROOT));
        }

        let (id, next_child) = self.stack.last_mut()?;
        let children = &self.document.entry(*id).children;
        let Some(&child) = children.get(*next_child) else {
            self.stack.pop();
            return Some(StreamEvent::End);
        };
        *next_child += 1;

        if matches!(self.document.entry(child).kind, NodeKind::Element { .. }) {
            self.stack.push((child, 0));
        }
        Some(self.start_event(child))
    }
}
