//! Streaming driver.

use std::sync::Arc;

use sluice_ast::{StreamElement, StreamEvent, TextKind};
use tracing::debug;

use super::FaultPolicy;
use crate::{DeliveryError, ExecutionContext, Fragment};

/// Dispatches a [`StreamEvent`] sequence.
///
/// Keeps the stack of open elements and numbers elements in document order.
/// An element is dropped as soon as its end event has been dispatched.
///
/// The sequence must carry exactly one document element. Outside of it only
/// whitespace and comments are accepted, and both are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamFilter;

impl StreamFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn filter<I>(&self, events: I, ctx: &mut ExecutionContext) -> Result<(), DeliveryError>
    where
        I: IntoIterator<Item = StreamEvent>,
    {
        let policy = FaultPolicy::from_context(ctx)?;
        let delivery = Arc::clone(ctx.delivery_config());
        let mut open: Vec<StreamElement> = Vec::new();
        let mut next_id = 0u64;
        let mut root_closed = false;

        debug!(document = ctx.document_source(), "stream filtering started");

        for event in events {
            match event {
                StreamEvent::Start { name, attributes } => {
                    if root_closed {
                        return Err(DeliveryError::malformed(format!(
                            "second document element '{}'",
                            name
                        )));
                    }
                    let element = StreamElement::new(next_id, name, attributes, open.len());
                    next_id += 1;

                    if let Some(parent) = open.last() {
                        for chain in delivery.chains_for(parent.name()) {
                            let result = chain.on_child_element_stream(parent, &element, ctx);
                            policy.handle(Fragment::from(parent), result, ctx)?;
                        }
                    }
                    for chain in delivery.chains_for(element.name()) {
                        let result = chain.visit_before_stream(&element, ctx);
                        policy.handle(Fragment::from(&element), result, ctx)?;
                    }
                    open.push(element);
                }
                StreamEvent::Text(text) => {
                    let Some(current) = open.last() else {
                        if text.kind == TextKind::Comment || text.is_whitespace() {
                            continue;
                        }
                        return Err(DeliveryError::malformed(
                            "text outside of the document element",
                        ));
                    };
                    for chain in delivery.chains_for(current.name()) {
                        let result = chain.on_child_text_stream(current, &text, ctx);
                        policy.handle(Fragment::from(current), result, ctx)?;
                    }
                }
                StreamEvent::End => {
                    let element = open
                        .pop()
                        .ok_or_else(|| DeliveryError::malformed("end event without open element"))?;
                    root_closed = open.is_empty();
                    for chain in delivery.chains_for(element.name()) {
                        let result = chain.visit_after_stream(&element, ctx);
                        policy.handle(Fragment::from(&element), result, ctx)?;
                    }
                }
            }
        }

        if let Some(element) = open.last() {
            return Err(DeliveryError::malformed(format!(
                "{} element(s) left open, innermost '{}'",
                open.len(),
                element.name()
            )));
        }

        debug!(
            document = ctx.document_source(),
            elements = next_id,
            "stream filtering finished"
        );
        Ok(())
    }
}
