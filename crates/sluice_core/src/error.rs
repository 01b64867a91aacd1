//! Delivery error types.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::{BoxError, Capability};

/// Errors raised by the dispatch core.
///
/// Streaming callbacks fail with [`io::Error`], tree callbacks with an arbitrary
/// boxed error. Both are folded into this one type at the interceptor chain
/// boundary, with the original cause kept as the error source.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Invalid execution context or delivery configuration setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A streaming visitor callback failed.
    #[error("Visitor failed during {capability}: {source}")]
    Stream {
        capability: Capability,
        #[source]
        source: io::Error,
    },

    /// A tree visitor callback failed.
    #[error("Visitor failed during {capability}: {source}")]
    Visitor {
        capability: Capability,
        #[source]
        source: BoxError,
    },

    /// An execution event listener failed.
    #[error("Execution event listener failed: {0}")]
    Listener(#[source] BoxError),

    /// The event stream is not well formed.
    #[error("Malformed event stream: {0}")]
    Malformed(String),

    /// A driver abandoned the run after a fault.
    #[error("Filtering aborted at {fragment}: {source}")]
    Aborted {
        fragment: String,
        #[source]
        source: Arc<DeliveryError>,
    },

    /// Document model error.
    #[error("Document error: {0}")]
    Document(#[from] sluice_ast::DocumentError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error outside of a visitor callback.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DeliveryError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wraps a streaming callback failure.
    pub fn stream(capability: Capability, source: io::Error) -> Self {
        Self::Stream { capability, source }
    }

    /// Wraps a tree callback failure.
    pub fn visitor(capability: Capability, source: impl Into<BoxError>) -> Self {
        Self::Visitor {
            capability,
            source: source.into(),
        }
    }

    /// Wraps a listener failure.
    pub fn listener(source: impl Into<BoxError>) -> Self {
        Self::Listener(source.into())
    }

    /// Creates a malformed stream error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns the capability of the failed callback, if this is a callback fault.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Self::Stream { capability, .. } | Self::Visitor { capability, .. } => {
                Some(*capability)
            }
            Self::Aborted { source, .. } => source.capability(),
            _ => None,
        }
    }

    /// Returns true if a visitor callback raised this error.
    pub fn is_callback(&self) -> bool {
        self.capability().is_some()
    }
}
