//! # sluice_ast
//!
//! Document models consumed by the sluice dispatch core.
//!
//! A document reaches the pipeline in one of two shapes:
//!
//! - **Streaming**: a sequence of [`StreamEvent`]s. The driver materializes one
//!   [`StreamElement`] per open element and lends it to visitors for the
//!   duration of a single callback.
//! - **Tree**: an index-arena [`Document`] whose [`Node`] handles stay valid for
//!   the lifetime of the document.
//!
//! ## Example
//!
//! ```rust
//! use sluice_ast::{Document, StreamEvent};
//!
//! let mut doc = Document::new("order");
//! let root = doc.root().id();
//! let item = doc.append_element(root, "item").unwrap();
//! doc.append_text(item, "widget").unwrap();
//!
//! let events: Vec<StreamEvent> = doc.events().collect();
//! assert_eq!(events.len(), 5);
//! ```

mod document;
mod error;
mod json;
mod stream;

pub use document::{Document, Events, Node, NodeId, NodeKind};
pub use error::DocumentError;
pub use stream::{Attribute, StreamElement, StreamEvent, StreamText, TextKind};
