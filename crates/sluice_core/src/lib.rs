//! # sluice_core
//!
//! Visitor interception and dispatch engine.
//!
//! This crate provides:
//! - The [`Visitor`] contract and its closed [`Capability`] set
//! - [`InterceptorChain`] dispatch with the event and logging interceptors
//! - Per-run [`ExecutionContext`] with checkpoint/restore of visitor state
//! - Streaming and tree drivers, plus a parallel runner over many documents
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sluice_ast::Document;
//! use sluice_core::event::EventRecorder;
//! use sluice_core::filter::{FilterMode, filter_document};
//! use sluice_core::{Capability, CapabilitySet, DeliveryConfig, ExecutionContext, Visitor};
//!
//! struct Before;
//!
//! impl Visitor for Before {
//!     fn capabilities(&self) -> CapabilitySet {
//!         CapabilitySet::of(&[Capability::TreeBefore])
//!     }
//! }
//!
//! let delivery = Arc::new(
//!     DeliveryConfig::builder()
//!         .bind_visitor("order", Arc::new(Before))
//!         .build(),
//! );
//! let mut ctx = ExecutionContext::new(delivery);
//! let recorder = Arc::new(EventRecorder::new());
//! ctx.set_event_listener(Arc::clone(&recorder));
//!
//! filter_document(&Document::new("order"), FilterMode::Tree, &mut ctx).unwrap();
//! assert_eq!(recorder.len(), 2);
//! ```

mod capability;
mod config;
pub mod context;
mod delivery;
mod error;
pub mod event;
pub mod filter;
mod fragment;
pub mod interceptor;
mod memento;
mod registry;
mod visitor;

pub use capability::{Capability, CapabilitySet, Representation, VisitSequence};
pub use config::{FilterConfig, ResourceConfig, WILDCARD_SELECTOR};
pub use context::{
    ApplicationContext, BeanContext, DEFAULT_DOCUMENT_URI, ExecutionContext, ProfileSet,
};
pub use delivery::{DeliveryConfig, DeliveryConfigBuilder};
pub use error::DeliveryError;
pub use event::ExecutionEventListener;
pub use fragment::{Fragment, FragmentId};
pub use interceptor::{Interceptor, InterceptorChain, Invocation, Next};
pub use memento::{HandlerId, Memento, MementoCaretaker};
pub use registry::{VisitorFactory, VisitorRegistry};
pub use visitor::{BoxError, VisitResult, Visitor};

#[cfg(test)]
pub mod test_utils;
