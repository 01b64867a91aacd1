//! Built-in visitors.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

use sluice_ast::{Node, StreamElement, StreamText};
use sluice_core::{
    BoxError, Capability, CapabilitySet, DeliveryError, ExecutionContext, FragmentId, HandlerId,
    ResourceConfig, VisitResult, Visitor, VisitorRegistry,
};

/// Registry of every built-in visitor.
pub fn builtin_registry() -> VisitorRegistry {
    let mut registry = VisitorRegistry::new();
    registry.register(ElementCounter::NAME, |resource| {
        Ok(Arc::new(ElementCounter::from_resource(resource)) as Arc<dyn Visitor>)
    });
    registry.register(TextCapture::NAME, |resource| {
        Ok(Arc::new(TextCapture::from_resource(resource)?) as Arc<dyn Visitor>)
    });
    registry.register(FailVisitor::NAME, |resource| {
        Ok(Arc::new(FailVisitor::from_resource(resource)?) as Arc<dyn Visitor>)
    });
    registry
}

fn bool_parameter(
    resource: &ResourceConfig,
    name: &str,
    default: bool,
) -> Result<bool, DeliveryError> {
    match resource.parameter(name) {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(DeliveryError::config(format!(
            "Parameter '{}' of '{}' must be true or false, got '{}'",
            name, resource.resource, other
        ))),
    }
}

/// Element counts per element name, stored in the bean context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementCounts(pub BTreeMap<String, u64>);

/// Counts visited elements by name into an [`ElementCounts`] bean.
///
/// Parameters: `bean` (default `elementCounts`).
pub struct ElementCounter {
    bean: String,
}

impl ElementCounter {
    pub const NAME: &'static str = "element-counter";
    pub const DEFAULT_BEAN: &'static str = "elementCounts";

    pub fn from_resource(resource: &ResourceConfig) -> Self {
        Self {
            bean: resource
                .parameter("bean")
                .unwrap_or(Self::DEFAULT_BEAN)
                .to_string(),
        }
    }

    fn count(&self, name: &str, ctx: &mut ExecutionContext) {
        let counts = ctx.bean_context_mut().get_or_default::<ElementCounts>(&self.bean);
        *counts.0.entry(name.to_string()).or_default() += 1;
    }
}

impl Visitor for ElementCounter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::of(&[Capability::StreamBefore, Capability::TreeBefore])
    }

    fn visit_before_stream(
        &self,
        element: &StreamElement,
        ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.count(element.name(), ctx);
        Ok(())
    }

    fn visit_before_tree(&self, node: Node<'_>, ctx: &mut ExecutionContext) -> VisitResult {
        if let Some(name) = node.name() {
            self.count(name, ctx);
        }
        Ok(())
    }
}

/// Collects the direct text of an element and writes `name: text` lines to
/// the output sink when the element closes.
///
/// The text gathered so far is stashed in the memento caretaker under the
/// element's fragment. Parameters: `trim` (default `true`).
pub struct TextCapture {
    trim: bool,
}

impl TextCapture {
    pub const NAME: &'static str = "text-capture";

    pub fn from_resource(resource: &ResourceConfig) -> Result<Self, DeliveryError> {
        Ok(Self {
            trim: bool_parameter(resource, "trim", true)?,
        })
    }

    fn begin(&self, fragment: FragmentId, ctx: &mut ExecutionContext) {
        ctx.memento_caretaker_mut()
            .stash(HandlerId::of(self), fragment, String::new());
    }

    fn append(&self, fragment: FragmentId, text: &str, ctx: &mut ExecutionContext) {
        let handler = HandlerId::of(self);
        let caretaker = ctx.memento_caretaker_mut();
        match caretaker.state_mut::<String>(handler, fragment) {
            Some(buffer) => buffer.push_str(text),
            None => caretaker.stash(handler, fragment, text.to_string()),
        }
    }

    fn finish(
        &self,
        name: &str,
        fragment: FragmentId,
        ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        let handler = HandlerId::of(self);
        let text = ctx
            .memento_caretaker()
            .state::<String>(handler, fragment)
            .cloned()
            .unwrap_or_default();
        ctx.memento_caretaker_mut().forget(handler, fragment);

        let text = if self.trim { text.trim() } else { text.as_str() };
        if text.is_empty() {
            return Ok(());
        }
        match ctx.writer_mut() {
            Some(writer) => writeln!(writer, "{}: {}", name, text),
            None => Ok(()),
        }
    }
}

impl Visitor for TextCapture {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::of(&[
            Capability::StreamBefore,
            Capability::StreamChildText,
            Capability::StreamAfter,
            Capability::TreeBefore,
            Capability::TreeChildText,
            Capability::TreeAfter,
        ])
    }

    fn visit_before_stream(
        &self,
        element: &StreamElement,
        ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.begin(FragmentId::Stream(element.id()), ctx);
        Ok(())
    }

    fn on_child_text_stream(
        &self,
        element: &StreamElement,
        text: &StreamText,
        ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.append(FragmentId::Stream(element.id()), text.as_str(), ctx);
        Ok(())
    }

    fn visit_after_stream(
        &self,
        element: &StreamElement,
        ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.finish(element.name(), FragmentId::Stream(element.id()), ctx)
    }

    fn visit_before_tree(&self, node: Node<'_>, ctx: &mut ExecutionContext) -> VisitResult {
        self.begin(FragmentId::Node(node.id()), ctx);
        Ok(())
    }

    fn visit_child_text_tree(&self, text: Node<'_>, ctx: &mut ExecutionContext) -> VisitResult {
        if let (Some(parent), Some(content)) = (text.parent(), text.text()) {
            self.append(FragmentId::Node(parent.id()), content, ctx);
        }
        Ok(())
    }

    fn visit_after_tree(&self, node: Node<'_>, ctx: &mut ExecutionContext) -> VisitResult {
        let name = node.name().unwrap_or_default();
        Ok(self.finish(name, FragmentId::Node(node.id()), ctx)?)
    }
}

/// Fails on purpose at one callback site.
///
/// Parameters: `at`, the capability to fail at (default `stream-before` and
/// `tree-before`).
pub struct FailVisitor {
    at: CapabilitySet,
}

impl FailVisitor {
    pub const NAME: &'static str = "fail";

    pub fn from_resource(resource: &ResourceConfig) -> Result<Self, DeliveryError> {
        let at = match resource.parameter("at") {
            None => CapabilitySet::of(&[Capability::StreamBefore, Capability::TreeBefore]),
            Some(label) => {
                let capability = Capability::ALL
                    .into_iter()
                    .find(|capability| capability.as_str() == label)
                    .ok_or_else(|| {
                        DeliveryError::config(format!(
                            "Unknown capability '{}' for '{}'",
                            label,
                            Self::NAME
                        ))
                    })?;
                CapabilitySet::EMPTY.with(capability)
            }
        };
        Ok(Self { at })
    }

    fn check(&self, capability: Capability, subject: &str) -> Result<(), String> {
        if self.at.contains(capability) {
            Err(format!("{} failed at {} on '{}'", Self::NAME, capability, subject))
        } else {
            Ok(())
        }
    }

    fn stream(&self, capability: Capability, subject: &str) -> io::Result<()> {
        self.check(capability, subject).map_err(io::Error::other)
    }

    fn tree(&self, capability: Capability, subject: &str) -> VisitResult {
        self.check(capability, subject).map_err(BoxError::from)
    }
}

impl Visitor for FailVisitor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        self.at
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
        element: &StreamElement,
        _text: &StreamText,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.stream(Capability::StreamChildText, element.name())
    }

    fn on_child_element_stream(
        &self,
        element: &StreamElement,
        _child: &StreamElement,
        _ctx: &mut ExecutionContext,
    ) -> io::Result<()> {
        self.stream(Capability::StreamChildElement, element.name())
    }

    fn visit_before_tree(&self, node: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        self.tree(Capability::TreeBefore, node.name().unwrap_or_default())
    }

    fn visit_after_tree(&self, node: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        self.tree(Capability::TreeAfter, node.name().unwrap_or_default())
    }

    fn visit_child_text_tree(&self, text: Node<'_>, _ctx: &mut ExecutionContext) -> VisitResult {
        let parent = text.parent().and_then(|parent| parent.name()).unwrap_or_default();
        self.tree(Capability::TreeChildText, parent)
    }

    fn visit_child_element_tree(
        &self,
        child: Node<'_>,
        _ctx: &mut ExecutionContext,
    ) -> VisitResult {
        let parent = child.parent().and_then(|parent| parent.name()).unwrap_or_default();
        self.tree(Capability::TreeChildElement, parent)
    }
}
