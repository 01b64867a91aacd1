//! Test helpers shared by the unit tests.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use sluice_ast::{Node, StreamElement, StreamText};

use crate::{
    BoxError, Capability, CapabilitySet, DeliveryConfig, ExecutionContext, VisitResult, Visitor,
};

/// Shared, ordered log of visitor calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Visitor that logs `name:capability:subject` for every callback and fails
/// on request.
pub struct RecordingVisitor {
    name: String,
    capabilities: CapabilitySet,
    calls: CallLog,
    failures: Vec<(Option<String>, Capability)>,
}

impl RecordingVisitor {
    pub fn new(name: impl Into<String>, capabilities: CapabilitySet, calls: CallLog) -> Self {
        Self {
            name: name.into(),
            capabilities,
            calls,
            failures: Vec::new(),
        }
    }

    /// Fails every callback of `capability`.
    pub fn failing_on(mut self, capability: Capability) -> Self {
        self.failures.push((None, capability));
        self
    }

    /// Fails callbacks of `capability` whose subject is `subject`.
    pub fn failing_when_named(mut self, subject: &str, capability: Capability) -> Self {
        self.failures.push((Some(subject.to_string()), capability));
        self
    }

    fn record(&self, capability: Capability, subject: &str) -> Result<(), String> {
        self.calls
            .push(format!("{}:{}:{}", self.name, capability, subject));
        let fails = self.failures.iter().any(|(name, failing)| {
            *failing == capability && name.as_deref().is_none_or(|name| name == subject)
        });
        if fails {
            Err(format!("{} failed on {}", capability, subject))
        } else {
            Ok(())
        }
    }

    fn stream(&self, capability: Capability, subject: &str) -> io::Result<()> {
        self.record(capability, subject).map_err(io::Error::other)
    }

    fn tree(&self, capability: Capability, subject: &str) -> VisitResult {
        self.record(capability, subject).map_err(BoxError::from)
    }
}

impl Visitor for RecordingVisitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn visit_before_stream(
        &self,
        element: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.stream(Capability::StreamBefore, element.name())
    }

    fn visit_after_stream(
        &self,
        element: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.stream(Capability::StreamAfter, element.name())
    }

    fn on_child_text_stream(
        &self,
        _element: &StreamElement,
        text: &StreamText,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.stream(Capability::StreamChildText, text.as_str())
    }

    fn on_child_element_stream(
        &self,
        _element: &StreamElement,
        child: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.stream(Capability::StreamChildElement, child.name())
    }

    fn visit_before_tree(&self, node: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        self.tree(Capability::TreeBefore, node.name().unwrap_or("#text"))
    }

    fn visit_after_tree(&self, node: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        self.tree(Capability::TreeAfter, node.name().unwrap_or("#text"))
    }

    fn visit_child_text_tree(&self, text: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        self.tree(Capability::TreeChildText, text.text().unwrap_or_default())
    }

    fn visit_child_element_tree(
        &self,
        child: Node<'_>,
        _ctx: &mut ExecutionContext,
    ) -> VisitResult {
        self.tree(Capability::TreeChildElement, child.name().unwrap_or_default())
    }
}

/// Creates a context over `delivery`.
pub fn context_for(delivery: DeliveryConfig) -> ExecutionContext {
    ExecutionContext::new(Arc::new(delivery))
}
