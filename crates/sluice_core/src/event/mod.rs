//! Execution events.
//!
//! Two kinds of event are published while a run is dispatched:
//!
//! - [`ResourceTargetingEvent`]: a visitor is about to be applied to a fragment
//!   at its BEFORE site.
//! - [`VisitEvent`]: a visitor's callback completed for a fragment.
//!
//! Events borrow the fragment and the context, so they only exist for the
//! duration of the notification. Listeners that keep them convert to an owned
//! form, as [`EventRecorder`] does.

mod listeners;

use std::sync::Arc;

use crate::{BoxError, Capability, ExecutionContext, Fragment, ResourceConfig, VisitSequence};

pub use listeners::{
    CompositeListener, EventKind, EventRecorder, NoopListener, RecordedEvent, TracingListener,
};

/// Result returned by listener callbacks.
pub type ListenerResult = Result<(), BoxError>;

/// A visitor is about to be applied to a fragment.
#[derive(Debug, Clone, Copy)]
pub struct ResourceTargetingEvent<'e> {
    pub fragment: Fragment<'e>,
    pub resource: &'e ResourceConfig,
    pub capability: Capability,
    pub sequence: VisitSequence,
}

/// A visitor callback completed for a fragment.
#[derive(Clone, Copy)]
pub struct VisitEvent<'e> {
    pub fragment: Fragment<'e>,
    pub capability: Capability,
    pub resource: &'e ResourceConfig,
    pub sequence: VisitSequence,
    pub context: &'e ExecutionContext,
}

impl std::fmt::Debug for VisitEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitEvent")
            .field("fragment", &self.fragment)
            .field("capability", &self.capability)
            .field("resource", &self.resource.resource)
            .field("sequence", &self.sequence)
            .field("document", &self.context.document_source())
            .finish()
    }
}

/// Observer of execution events.
///
/// Listeners only ever see the execution context by shared reference; they
/// cannot record a terminal fault or otherwise mutate the run. A listener that
/// fails aborts the callback site exactly like a failing visitor.
pub trait ExecutionEventListener: Send + Sync {
    fn on_targeting(&self, _event: &ResourceTargetingEvent<'_>) -> ListenerResult {
        Ok(())
    }

    fn on_visit(&self, _event: &VisitEvent<'_>) -> ListenerResult {
        Ok(())
    }
}

impl<L: ExecutionEventListener + ?Sized> ExecutionEventListener for Arc<L> {
    fn on_targeting(&self, event: &ResourceTargetingEvent<'_>) -> ListenerResult {
        (**self).on_targeting(event)
    }

    fn on_visit(&self, event: &VisitEvent<'_>) -> ListenerResult {
        (**self).on_visit(event)
    }
}

impl<L: ExecutionEventListener + ?Sized> ExecutionEventListener for Box<L> {
    fn on_targeting(&self, event: &ResourceTargetingEvent<'_>) -> ListenerResult {
        (**self).on_targeting(event)
    }

    fn on_visit(&self, event: &VisitEvent<'_>) -> ListenerResult {
        (**self).on_visit(event)
    }
}
