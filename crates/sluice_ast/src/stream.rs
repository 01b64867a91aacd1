//! Streaming document model.
//!
//! Streaming drivers never hold the whole document. They keep one
//! [`StreamElement`] per currently open element and lend it to visitors by
//! shared reference, so a visitor cannot keep an element past the callback
//! that received it.

use serde::Serialize;

/// A single `name="value"` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Creates a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Kind of character data carried by a text event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    #[default]
    Text,
    CData,
    Comment,
}

/// Character data delivered to child-text callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamText {
    pub text: String,
    pub kind: TextKind,
}

impl StreamText {
    /// Creates plain text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: TextKind::Text,
        }
    }

    /// Creates a CDATA section.
    pub fn cdata(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: TextKind::CData,
        }
    }

    /// Creates a comment.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: TextKind::Comment,
        }
    }

    /// Returns the character data.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if the text consists only of whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// An element open in a streaming traversal.
///
/// `id` is assigned by the driver in document order and is unique within one
/// run. It is what listeners and mementos use to correlate the BEFORE and
/// AFTER callbacks of the same element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamElement {
    id: u64,
    name: String,
    attributes: Vec<Attribute>,
    depth: usize,
}

impl StreamElement {
    /// Creates a new streaming element.
    pub fn new(id: u64, name: impl Into<String>, attributes: Vec<Attribute>, depth: usize) -> Self {
        Self {
            id,
            name: name.into(),
            attributes,
            depth,
        }
    }

    /// Returns the driver-assigned identity of this element.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the element name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all attributes in document order.
    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Returns the nesting depth (0 for the document element).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// One event of a streaming document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An element was opened.
    Start {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// Character data inside the current element.
    Text(StreamText),
    /// The current element was closed.
    End,
}

impl StreamEvent {
    /// Creates a start event without attributes.
    pub fn start(name: impl Into<String>) -> Self {
        Self::Start {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Creates a start event with attributes.
    pub fn start_with(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::Start {
            name: name.into(),
            attributes,
        }
    }

    /// Creates a plain text event.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(StreamText::new(text))
    }

    /// Creates an end event.
    pub fn end() -> Self {
        Self::End
    }
}
