//! Interception of visitor callbacks.
//!
//! Every callback site builds an [`Invocation`] and hands it to the
//! [`InterceptorChain`] that wraps the target visitor. The chain runs its
//! interceptors in registration order; each one receives a [`Next`]
//! continuation and decides what to do before and after calling
//! [`Next::proceed`]. The last continuation invokes the action on the target.

mod event;
mod logging;

use std::fmt;
use std::sync::Arc;

use sluice_ast::{Node, StreamElement, StreamText};

use crate::{
    Capability, DeliveryError, ExecutionContext, Fragment, HandlerId, ResourceConfig,
    VisitResult, Visitor,
};

pub use event::EventInterceptor;
pub use logging::LoggingInterceptor;

type Action<'f> =
    Box<dyn FnOnce(&dyn Visitor, &mut ExecutionContext) -> Result<(), DeliveryError> + 'f>;

/// A single pending callback.
///
/// Consumed by [`invoke`](Self::invoke), so it runs at most once.
pub struct Invocation<'f> {
    capability: Capability,
    fragment: Fragment<'f>,
    action: Action<'f>,
}

impl<'f> Invocation<'f> {
    pub fn new<F>(capability: Capability, fragment: Fragment<'f>, action: F) -> Self
    where
        F: FnOnce(&dyn Visitor, &mut ExecutionContext) -> Result<(), DeliveryError> + 'f,
    {
        Self {
            capability,
            fragment,
            action: Box::new(action),
        }
    }

    /// Callback role this invocation performs.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Fragment events for this invocation are reported against.
    pub fn fragment(&self) -> Fragment<'f> {
        self.fragment
    }

    /// Runs the action against `visitor`.
    pub fn invoke(
        self,
        visitor: &dyn Visitor,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        (self.action)(visitor, ctx)
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("capability", &self.capability)
            .field("fragment", &self.fragment)
            .finish_non_exhaustive()
    }
}

/// Cross-cutting logic run around visitor callbacks.
///
/// Implementations must hand every fault they observe back to the caller.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str;

    fn intercept(
        &self,
        invocation: Invocation<'_>,
        ctx: &mut ExecutionContext,
        next: Next<'_>,
    ) -> Result<(), DeliveryError>;
}

/// Continuation over the rest of an interceptor chain.
#[derive(Clone, Copy)]
pub struct Next<'c> {
    interceptors: &'c [Arc<dyn Interceptor>],
    target: &'c dyn Visitor,
    resource: &'c ResourceConfig,
}

impl<'c> Next<'c> {
    /// The visitor at the end of the chain.
    pub fn target(&self) -> &'c dyn Visitor {
        self.target
    }

    /// The resource binding of the target.
    pub fn resource(&self) -> &'c ResourceConfig {
        self.resource
    }

    pub fn handler_id(&self) -> HandlerId {
        HandlerId::of(self.target)
    }

    /// Number of interceptors still to run.
    pub fn remaining(&self) -> usize {
        self.interceptors.len()
    }

    /// Runs the next interceptor, or the invocation itself once none remain.
    pub fn proceed(
        self,
        invocation: Invocation<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        match self.interceptors.split_first() {
            Some((interceptor, rest)) => interceptor.intercept(
                invocation,
                ctx,
                Next {
                    interceptors: rest,
                    ..self
                },
            ),
            None => invocation.invoke(self.target, ctx),
        }
    }
}

fn tree_fault(capability: Capability, result: VisitResult) -> Result<(), DeliveryError> {
    result.map_err(|source| DeliveryError::visitor(capability, source))
}

/// One visitor bound to a resource, wrapped in its interceptors.
#[derive(Clone)]
pub struct InterceptorChain {
    target: Arc<dyn Visitor>,
    resource: ResourceConfig,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Creates a chain with no interceptors.
    pub fn new(target: Arc<dyn Visitor>, resource: ResourceConfig) -> Self {
        Self {
            target,
            resource,
            interceptors: Vec::new(),
        }
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn target(&self) -> &dyn Visitor {
        self.target.as_ref()
    }

    pub fn resource(&self) -> &ResourceConfig {
        &self.resource
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    pub fn handler_id(&self) -> HandlerId {
        HandlerId::of(self.target.as_ref())
    }

    /// Runs `invocation` through every interceptor and then the target.
    pub fn intercept(
        &self,
        invocation: Invocation<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        Next {
            interceptors: &self.interceptors,
            target: self.target.as_ref(),
            resource: &self.resource,
        }
        .proceed(invocation, ctx)
    }

    pub fn visit_before_stream(
        &self,
        element: &StreamElement,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::StreamBefore;
        self.intercept(
            Invocation::new(capability, element.into(), move |visitor, ctx| {
                visitor
                    .visit_before_stream(element, ctx)
                    .map_err(|e| DeliveryError::stream(capability, e))
            }),
            ctx,
        )
    }

    pub fn visit_after_stream(
        &self,
        element: &StreamElement,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::StreamAfter;
        self.intercept(
            Invocation::new(capability, element.into(), move |visitor, ctx| {
                visitor
                    .visit_after_stream(element, ctx)
                    .map_err(|e| DeliveryError::stream(capability, e))
            }),
            ctx,
        )
    }

    /// Delivers a text child of `element`. Events are reported against `element`.
    pub fn on_child_text_stream(
        &self,
        element: &StreamElement,
        text: &StreamText,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::StreamChildText;
        self.intercept(
            Invocation::new(capability, element.into(), move |visitor, ctx| {
                visitor
                    .on_child_text_stream(element, text, ctx)
                    .map_err(|e| DeliveryError::stream(capability, e))
            }),
            ctx,
        )
    }

    /// Delivers an element child of `element`. Events are reported against `element`.
    pub fn on_child_element_stream(
        &self,
        element: &StreamElement,
        child: &StreamElement,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::StreamChildElement;
        self.intercept(
            Invocation::new(capability, element.into(), move |visitor, ctx| {
                visitor
                    .on_child_element_stream(element, child, ctx)
                    .map_err(|e| DeliveryError::stream(capability, e))
            }),
            ctx,
        )
    }

    pub fn visit_before_tree(
        &self,
        node: Node<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::TreeBefore;
        self.intercept(
            Invocation::new(capability, node.into(), move |visitor, ctx| {
                tree_fault(capability, visitor.visit_before_tree(node, ctx))
            }),
            ctx,
        )
    }

    pub fn visit_after_tree(
        &self,
        node: Node<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::TreeAfter;
        self.intercept(
            Invocation::new(capability, node.into(), move |visitor, ctx| {
                tree_fault(capability, visitor.visit_after_tree(node, ctx))
            }),
            ctx,
        )
    }

    /// Delivers a text node. Events are reported against the text node.
    pub fn visit_child_text_tree(
        &self,
        text: Node<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::TreeChildText;
        self.intercept(
            Invocation::new(capability, text.into(), move |visitor, ctx| {
                tree_fault(capability, visitor.visit_child_text_tree(text, ctx))
            }),
            ctx,
        )
    }

    /// Delivers an element child. Events are reported against its parent,
    /// the element whose children are being consumed.
    pub fn visit_child_element_tree(
        &self,
        child: Node<'_>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let capability = Capability::TreeChildElement;
        let container = child.parent().unwrap_or(child);
        self.intercept(
            Invocation::new(capability, container.into(), move |visitor, ctx| {
                tree_fault(capability, visitor.visit_child_element_tree(child, ctx))
            }),
            ctx,
        )
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("target", &self.target.name())
            .field("resource", &self.resource)
            .field(
                "interceptors",
                &self
                    .interceptors
                    .iter()
                    .map(|interceptor| interceptor.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
