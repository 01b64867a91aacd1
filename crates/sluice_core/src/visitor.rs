//! Visitor contract.

use std::io;

use sluice_ast::{Node, StreamElement, StreamText};

use crate::{CapabilitySet, ExecutionContext};

/// Boxed error returned by tree callbacks and listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a tree callback.
pub type VisitResult = Result<(), BoxError>;

/// A unit of processing attached to one or more traversal callbacks.
///
/// Every callback has a no-op default, so any visitor can be bound to any
/// site. [`capabilities`](Self::capabilities) declares the callbacks the
/// visitor actually implements; it controls which sites publish execution
/// events and has no effect on whether a callback is invoked.
///
/// Visitors are shared by every run of a [`DeliveryConfig`], so callbacks take
/// `&self`. Per-run state belongs in the [`ExecutionContext`], either in the
/// bean context or in the memento caretaker keyed by
/// [`HandlerId::of(self)`](crate::HandlerId::of).
///
/// [`DeliveryConfig`]: crate::DeliveryConfig
pub trait Visitor: Send + Sync {
    /// Human-readable name used in logs and targeting events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The callbacks this visitor implements.
    fn capabilities(&self) -> CapabilitySet;

    fn visit_before_stream(
        &self,
        _element: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        Ok(())
    }

    fn visit_after_stream(
        &self,
        _element: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        Ok(())
    }

    fn on_child_text_stream(
        &self,
        _element: &StreamElement,
        _text: &StreamText,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        Ok(())
    }

    fn on_child_element_stream(
        &self,
        _element: &StreamElement,
        _child: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        Ok(())
    }

    fn visit_before_tree(&self, _node: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        Ok(())
    }

    fn visit_after_tree(&self, _node: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        Ok(())
    }

    /// Receives a text child of the element the visitor is bound to.
    fn visit_child_text_tree(&self, _text: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        Ok(())
    }

    /// Receives an element child of the element the visitor is bound to.
    fn visit_child_element_tree(
        &self,
        _child: Node<'_>,
        _ctx: &mut ExecutionContext,
    ) -> VisitResult {
        Ok(())
    }
}
