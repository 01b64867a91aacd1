//! Stock execution event listeners.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::{ExecutionEventListener, ListenerResult, ResourceTargetingEvent, VisitEvent};
use crate::{Capability, FragmentId, VisitSequence};

/// Listener that ignores every event. The default listener of a context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ExecutionEventListener for NoopListener {}

/// Fans events out to several listeners in registration order.
///
/// Stops at the first listener that fails and returns its error.
#[derive(Default, Clone)]
pub struct CompositeListener {
    listeners: Vec<Arc<dyn ExecutionEventListener>>,
}

impl CompositeListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener.
    #[must_use]
    pub fn with(mut self, listener: Arc<dyn ExecutionEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn push(&mut self, listener: Arc<dyn ExecutionEventListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl ExecutionEventListener for CompositeListener {
    fn on_targeting(&self, event: &ResourceTargetingEvent<'_>) -> ListenerResult {
        self.listeners
            .iter()
            .try_for_each(|listener| listener.on_targeting(event))
    }

    fn on_visit(&self, event: &VisitEvent<'_>) -> ListenerResult {
        self.listeners
            .iter()
            .try_for_each(|listener| listener.on_visit(event))
    }
}

/// Kind of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Targeting,
    Visit,
}

/// Owned copy of an execution event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedEvent {
    pub kind: EventKind,
    pub fragment: FragmentId,
    pub fragment_name: Option<String>,
    pub capability: Capability,
    pub resource: String,
    pub sequence: VisitSequence,
}

/// Listener that records every event it receives.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the events recorded so far.
    pub fn take(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ExecutionEventListener for EventRecorder {
    fn on_targeting(&self, event: &ResourceTargetingEvent<'_>) -> ListenerResult {
        self.events.lock().push(RecordedEvent {
            kind: EventKind::Targeting,
            fragment: event.fragment.id(),
            fragment_name: event.fragment.name().map(str::to_string),
            capability: event.capability,
            resource: event.resource.resource.clone(),
            sequence: event.sequence,
        });
        Ok(())
    }

    fn on_visit(&self, event: &VisitEvent<'_>) -> ListenerResult {
        self.events.lock().push(RecordedEvent {
            kind: EventKind::Visit,
            fragment: event.fragment.id(),
            fragment_name: event.fragment.name().map(str::to_string),
            capability: event.capability,
            resource: event.resource.resource.clone(),
            sequence: event.sequence,
        });
        Ok(())
    }
}

/// Listener that emits every event as a `tracing` debug record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl ExecutionEventListener for TracingListener {
    fn on_targeting(&self, event: &ResourceTargetingEvent<'_>) -> ListenerResult {
        debug!(
            fragment = %event.fragment,
            resource = %event.resource.resource,
            selector = %event.resource.selector,
            "targeting {}",
            event.capability
        );
        Ok(())
    }

    fn on_visit(&self, event: &VisitEvent<'_>) -> ListenerResult {
        debug!(
            fragment = %event.fragment,
            resource = %event.resource.resource,
            sequence = %event.sequence,
            document = event.context.document_source(),
            "visited {}",
            event.capability
        );
        Ok(())
    }
}
