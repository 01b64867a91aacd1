//! Tree driver.

use std::sync::Arc;

use sluice_ast::{Document, Node};
use tracing::debug;

use super::FaultPolicy;
use crate::{DeliveryConfig, DeliveryError, ExecutionContext, Fragment};

/// Walks a [`Document`] in document order.
///
/// For every element: BEFORE, then each child in turn (text children go to
/// the element's child-text callback; element children go to its
/// child-element callback and are then walked themselves), then AFTER.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeFilter;

impl TreeFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn filter(
        &self,
        document: &Document,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let policy = FaultPolicy::from_context(ctx)?;
        let delivery = Arc::clone(ctx.delivery_config());
        let root = document.root();

        debug!(
            document = ctx.document_source(),
            nodes = document.node_count(),
            "tree filtering started"
        );

        enter(&delivery, policy, root, ctx)?;
        let mut stack = vec![(root, root.children())];
        while let Some((node, children)) = stack.last_mut() {
            let node = *node;
            let next = children.next();
            let name = node.name().unwrap_or_default();
            match next {
                Some(child) if child.is_text() => {
                    for chain in delivery.chains_for(name) {
                        let result = chain.visit_child_text_tree(child, ctx);
                        policy.handle(Fragment::from(child), result, ctx)?;
                    }
                }
                Some(child) => {
                    for chain in delivery.chains_for(name) {
                        let result = chain.visit_child_element_tree(child, ctx);
                        policy.handle(Fragment::from(node), result, ctx)?;
                    }
                    enter(&delivery, policy, child, ctx)?;
                    stack.push((child, child.children()));
                }
                None => {
                    stack.pop();
                    for chain in delivery.chains_for(name) {
                        let result = chain.visit_after_tree(node, ctx);
                        policy.handle(Fragment::from(node), result, ctx)?;
                    }
                }
            }
        }

        debug!(document = ctx.document_source(), "tree filtering finished");
        Ok(())
    }
}

fn enter(
    delivery: &DeliveryConfig,
    policy: FaultPolicy,
    node: Node<'_>,
    ctx: &mut ExecutionContext,
) -> Result<(), DeliveryError> {
    for chain in delivery.chains_for(node.name().unwrap_or_default()) {
        let result = chain.visit_before_tree(node, ctx);
        policy.handle(Fragment::from(node), result, ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TERMINATE_ON_VISITOR_EXCEPTION;
    use crate::test_utils::{CallLog, RecordingVisitor, context_for};
    use crate::{Capability, CapabilitySet};
    use pretty_assertions::assert_eq;

    fn order() -> Document {
        let mut doc = Document::new("order");
        let root = doc.root().id();
        let item = doc.append_element(root, "item").unwrap();
        doc.append_text(item, "widget").unwrap();
        doc.append_element(root, "note").unwrap();
        doc
    }

    #[test]
    fn test_dispatch_order() {
        let calls = CallLog::default();
        let visitor = RecordingVisitor::new("v", CapabilitySet::tree_all(), calls.clone());
        let delivery = DeliveryConfig::builder()
            .bind_visitor("*", Arc::new(visitor))
            .build();
        let mut ctx = context_for(delivery);

        TreeFilter::new().filter(&order(), &mut ctx).unwrap();

        assert_eq!(
            calls.entries(),
            vec![
                "v:tree-before:order",
                "v:tree-child-element:item",
                "v:tree-before:item",
                "v:tree-child-text:widget",
                "v:tree-after:item",
                "v:tree-child-element:note",
                "v:tree-before:note",
                "v:tree-after:note",
                "v:tree-after:order",
            ]
        );
    }

    #[test]
    fn test_selected_elements_only() {
        let calls = CallLog::default();
        let visitor = RecordingVisitor::new("v", CapabilitySet::tree_all(), calls.clone());
        let delivery = DeliveryConfig::builder()
            .bind_visitor("order", Arc::new(visitor))
            .build();
        let mut ctx = context_for(delivery);

        TreeFilter::new().filter(&order(), &mut ctx).unwrap();

        assert_eq!(
            calls.entries(),
            vec![
                "v:tree-before:order",
                "v:tree-child-element:item",
                "v:tree-child-element:note",
                "v:tree-after:order",
            ]
        );
    }

    #[test]
    fn test_fault_aborts_and_records() {
        let calls = CallLog::default();
        let visitor = RecordingVisitor::new("v", CapabilitySet::tree_all(), calls.clone())
            .failing_on(Capability::TreeChildText);
        let delivery = DeliveryConfig::builder()
            .bind_visitor("item", Arc::new(visitor))
            .build();
        let mut ctx = context_for(delivery);

        let err = TreeFilter::new().filter(&order(), &mut ctx).unwrap_err();

        assert!(matches!(
            err,
            DeliveryError::Aborted { ref fragment, .. } if fragment == "#text (node:#2)"
        ));
        assert_eq!(
            ctx.termination_error().and_then(|e| e.capability()),
            Some(Capability::TreeChildText)
        );
        assert_eq!(
            calls.entries(),
            vec!["v:tree-before:item", "v:tree-child-text:widget"]
        );
    }

    #[test]
    fn test_continue_keeps_first_fault() {
        let calls = CallLog::default();
        let visitor = RecordingVisitor::new("v", CapabilitySet::tree_all(), calls.clone())
            .failing_on(Capability::TreeBefore)
            .failing_on(Capability::TreeAfter);
        let delivery = DeliveryConfig::builder()
            .parameter(TERMINATE_ON_VISITOR_EXCEPTION, "false")
            .bind_visitor("item", Arc::new(visitor))
            .build();
        let mut ctx = context_for(delivery);

        TreeFilter::new().filter(&order(), &mut ctx).unwrap();

        assert_eq!(calls.entries().len(), 3);
        assert_eq!(
            ctx.termination_error().and_then(|e| e.capability()),
            Some(Capability::TreeBefore)
        );
    }

    #[test]
    fn test_deep_document_does_not_recurse() {
        let mut doc = Document::new("n");
        let mut parent = doc.root().id();
        for _ in 0..10_000 {
            parent = doc.append_element(parent, "n").unwrap();
        }
        let calls = CallLog::default();
        let visitor = RecordingVisitor::new("v", CapabilitySet::EMPTY, calls.clone());
        let delivery = DeliveryConfig::builder()
            .bind_visitor("n", Arc::new(visitor))
            .build();
        let mut ctx = context_for(delivery);

        TreeFilter::new().filter(&doc, &mut ctx).unwrap();

        // before + after per node, plus one child-element per non-leaf node
        assert_eq!(calls.entries().len(), 10_001 * 2 + 10_000);
    }
}
