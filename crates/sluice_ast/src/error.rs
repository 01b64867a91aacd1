//! Document model error types.

use thiserror::Error;

use crate::NodeId;

/// Errors that can occur while building or loading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The referenced node does not exist in this document.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Children and attributes can only be attached to element nodes.
    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    /// The JSON form did not describe a document.
    #[error("Invalid document: {0}")]
    Invalid(String),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    /// Creates an invalid document error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
