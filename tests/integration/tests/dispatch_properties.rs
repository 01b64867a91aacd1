//! Integration tests for the dispatch core
//!
//! Drives visitors through the public API only: delivery configuration,
//! interceptor chains, execution context and the two drivers.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;
use sluice_ast::{Document, Node, StreamElement, StreamEvent};
use sluice_core::event::{EventKind, EventRecorder, RecordedEvent};
use sluice_core::filter::{FilterMode, StreamFilter, filter_document, run_parallel};
use sluice_core::{
    BoxError, Capability, CapabilitySet, DeliveryConfig, DeliveryError, ExecutionContext,
    ExecutionEventListener, FragmentId, HandlerId, Interceptor, InterceptorChain, Invocation,
    Next, ResourceConfig, VisitResult, VisitSequence, Visitor,
};

/// Visitor declaring a fixed capability set that can fail at one site.
struct Scripted {
    capabilities: CapabilitySet,
    fail_at: Option<Capability>,
}

impl Scripted {
    fn new(capabilities: CapabilitySet) -> Self {
        Self {
            capabilities,
            fail_at: None,
        }
    }

    fn failing_at(mut self, capability: Capability) -> Self {
        self.fail_at = Some(capability);
        self
    }

    fn check(&self, capability: Capability) -> Result<(), String> {
        if self.fail_at == Some(capability) {
            Err(format!("scripted failed at {}", capability))
        } else {
            Ok(())
        }
    }
}

impl Visitor for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    fn visit_before_stream(&self, _: &StreamElement, _: &mut ExecutionContext) -> io::Result<()> {
        self.check(Capability::StreamBefore).map_err(io::Error::other)
    }

    fn visit_after_stream(&self, _: &StreamElement, _: &mut ExecutionContext) -> io::Result<()> {
        self.check(Capability::StreamAfter).map_err(io::Error::other)
    }

    fn visit_before_tree(&self, _: Node<'_>, _: &mut ExecutionContext) -> VisitResult {
        self.check(Capability::TreeBefore).map_err(BoxError::from)
    }

    fn visit_after_tree(&self, _: Node<'_>, _: &mut ExecutionContext) -> VisitResult {
        self.check(Capability::TreeAfter).map_err(BoxError::from)
    }

    fn visit_child_element_tree(&self, _: Node<'_>, _: &mut ExecutionContext) -> VisitResult {
        self.check(Capability::TreeChildElement).map_err(BoxError::from)
    }
}

/// Interceptor counting every invocation that passes through it.
#[derive(Default)]
struct Counting(AtomicUsize);

impl Interceptor for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn intercept(
        &self,
        invocation: Invocation<'_>,
        ctx: &mut ExecutionContext,
        next: Next<'_>,
    ) -> Result<(), DeliveryError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        next.proceed(invocation, ctx)
    }
}

fn chain_for(scripted: Scripted) -> InterceptorChain {
    let delivery = DeliveryConfig::builder()
        .bind_visitor("*", Arc::new(scripted))
        .build();
    delivery.bindings()[0].clone()
}

fn recording_context() -> (ExecutionContext, Arc<EventRecorder>) {
    let mut ctx = ExecutionContext::new(Arc::new(DeliveryConfig::default()));
    let recorder = Arc::new(EventRecorder::new());
    ctx.set_event_listener(Arc::clone(&recorder));
    (ctx, recorder)
}

fn kinds(events: &[RecordedEvent]) -> Vec<(EventKind, VisitSequence)> {
    events.iter().map(|e| (e.kind, e.sequence)).collect()
}

mod capability_gating {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case(Capability::StreamBefore)]
    #[case(Capability::StreamAfter)]
    fn undeclared_stream_capability_publishes_nothing(#[case] capability: Capability) {
        let counting = Arc::new(Counting::default());
        let delivery = DeliveryConfig::builder()
            .interceptor(Arc::clone(&counting) as Arc<dyn Interceptor>)
            .bind_visitor("*", Arc::new(Scripted::new(CapabilitySet::tree_all())))
            .build();
        let chain = &delivery.bindings()[0];
        let (mut ctx, recorder) = recording_context();
        let element = StreamElement::new(0, "item", Vec::new(), 0);

        let result = match capability {
            Capability::StreamBefore => chain.visit_before_stream(&element, &mut ctx),
            _ => chain.visit_after_stream(&element, &mut ctx),
        };

        result.unwrap();

        assert!(recorder.is_empty());
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scenario_a_before_only_handler() {
        let chain = chain_for(Scripted::new(CapabilitySet::of(&[Capability::TreeBefore])));
        let (mut ctx, recorder) = recording_context();
        let document = Document::new("order");

        chain.visit_before_tree(document.root(), &mut ctx).unwrap();
        chain.visit_after_tree(document.root(), &mut ctx).unwrap();

        assert_eq!(
            kinds(&recorder.events()),
            vec![
                (EventKind::Targeting, VisitSequence::Before),
                (EventKind::Visit, VisitSequence::Before),
            ]
        );
    }
}

mod ordering_and_failure {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn targeting_precedes_before_visit() {
        let chain = chain_for(Scripted::new(CapabilitySet::stream_all()));
        let (mut ctx, recorder) = recording_context();
        let element = StreamElement::new(9, "item", Vec::new(), 0);

        chain.visit_before_stream(&element, &mut ctx).unwrap();

        let events = recorder.events();
        assert_eq!(events[0].kind, EventKind::Targeting);
        assert_eq!(events[1].kind, EventKind::Visit);
        assert_eq!(events[0].fragment, events[1].fragment);
    }

    #[test]
    fn scenario_b_failing_after_publishes_no_visit() {
        let chain = chain_for(
            Scripted::new(CapabilitySet::stream_all()).failing_at(Capability::StreamAfter),
        );
        let (mut ctx, recorder) = recording_context();
        let element = StreamElement::new(1, "item", Vec::new(), 0);

        let err = chain.visit_after_stream(&element, &mut ctx).unwrap_err();

        match err {
            DeliveryError::Stream { capability, source } => {
                assert_eq!(capability, Capability::StreamAfter);
                assert_eq!(source.to_string(), "scripted failed at stream-after");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(recorder.is_empty());
    }

    #[test]
    fn failing_listener_aborts_like_a_visitor() {
        struct Refusing;

        impl ExecutionEventListener for Refusing {
            fn on_targeting(
                &self,
                _event: &sluice_core::event::ResourceTargetingEvent<'_>,
            ) -> Result<(), BoxError> {
                Err("refused".into())
            }
        }

        let chain = chain_for(Scripted::new(CapabilitySet::stream_all()));
        let mut ctx = ExecutionContext::new(Arc::new(DeliveryConfig::default()));
        ctx.set_event_listener(Refusing);
        let element = StreamElement::new(0, "item", Vec::new(), 0);

        let err = chain.visit_before_stream(&element, &mut ctx).unwrap_err();
        assert!(matches!(err, DeliveryError::Listener(_)));
    }

    #[test]
    fn failing_visit_listener_aborts_after_the_callback_ran() {
        struct RefusingVisits;

        impl ExecutionEventListener for RefusingVisits {
            fn on_visit(
                &self,
                _event: &sluice_core::event::VisitEvent<'_>,
            ) -> Result<(), BoxError> {
                Err("visit listener down".into())
            }
        }

        #[derive(Default)]
        struct Touched(AtomicUsize);

        impl Visitor for Touched {
            fn capabilities(&self) -> CapabilitySet {
                CapabilitySet::of(&[Capability::StreamBefore])
            }

            fn visit_before_stream(
                &self,
                _: &StreamElement,
                _: &mut ExecutionContext,
            ) -> io::Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let touched = Arc::new(Touched::default());
        let delivery = DeliveryConfig::builder()
            .bind_visitor("a", Arc::clone(&touched) as Arc<dyn Visitor>)
            .build();
        let mut ctx = ExecutionContext::new(Arc::new(delivery));
        ctx.set_event_listener(RefusingVisits);

        let err = StreamFilter::new()
            .filter(vec![StreamEvent::start("a"), StreamEvent::end()], &mut ctx)
            .unwrap_err();

        assert_eq!(touched.0.load(Ordering::SeqCst), 1);
        match err {
            DeliveryError::Aborted { fragment, source } => {
                assert_eq!(fragment, "a (stream:0)");
                assert!(matches!(*source, DeliveryError::Listener(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            ctx.termination_error().map(|e| &**e),
            Some(DeliveryError::Listener(_))
        ));
    }

    #[test]
    fn scenario_c_child_element_reports_parent() {
        let chain = chain_for(Scripted::new(CapabilitySet::tree_all()));
        let (mut ctx, recorder) = recording_context();
        let mut document = Document::new("items");
        let parent = document.root().id();
        let child = document.append_element(parent, "item").unwrap();

        chain
            .visit_child_element_tree(document.node(child).unwrap(), &mut ctx)
            .unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fragment, FragmentId::Node(parent));
        assert_eq!(events[0].fragment_name.as_deref(), Some("items"));
    }
}

mod listeners {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replacing_listener_with_noop_stops_events() {
        let chain = chain_for(Scripted::new(CapabilitySet::stream_all()));
        let (mut ctx, recorder) = recording_context();
        let element = StreamElement::new(0, "item", Vec::new(), 0);

        chain.visit_before_stream(&element, &mut ctx).unwrap();
        let seen = recorder.len();
        ctx.clear_event_listener();
        chain.visit_before_stream(&element, &mut ctx).unwrap();
        chain.visit_after_stream(&element, &mut ctx).unwrap();

        assert_eq!(seen, 2);
        assert_eq!(recorder.len(), seen);
    }

    #[test]
    fn configured_listeners_see_every_run() {
        let shared = Arc::new(EventRecorder::new());
        let delivery = Arc::new(
            DeliveryConfig::builder()
                .listener(Arc::clone(&shared) as Arc<dyn ExecutionEventListener>)
                .bind_visitor("item", Arc::new(Scripted::new(CapabilitySet::stream_all())))
                .build(),
        );
        let events = vec![
            StreamEvent::start("order"),
            StreamEvent::start("item"),
            StreamEvent::end(),
            StreamEvent::end(),
        ];

        for _ in 0..2 {
            let mut ctx = ExecutionContext::new(Arc::clone(&delivery));
            StreamFilter::new().filter(events.clone(), &mut ctx).unwrap();
        }

        // targeting + before visit + after visit, twice
        assert_eq!(shared.len(), 6);
    }
}

mod memento {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn restore_right_after_checkpoint_is_invisible() {
        let mut ctx = ExecutionContext::new(Arc::new(DeliveryConfig::default()));
        let handler = HandlerId::from_raw(42);
        let fragment = FragmentId::Stream(3);
        ctx.memento_caretaker_mut()
            .stash(handler, fragment, vec!["a".to_string()]);

        let memento = ctx
            .memento_caretaker()
            .checkpoint(handler, fragment, VisitSequence::Before);
        ctx.memento_caretaker_mut().restore(&memento);
        ctx.memento_caretaker_mut().restore(&memento);

        assert_eq!(
            ctx.memento_caretaker()
                .state::<Vec<String>>(handler, fragment),
            Some(&vec!["a".to_string()])
        );
        assert_eq!(ctx.memento_caretaker().len(), 1);
    }

    #[test]
    fn speculative_pass_leaves_no_trace() {
        let mut ctx = ExecutionContext::new(Arc::new(DeliveryConfig::default()));
        let handler = HandlerId::from_raw(1);
        let fragment = FragmentId::Stream(0);

        let seen = ctx
            .speculate(handler, fragment, VisitSequence::Before, |ctx| {
                ctx.memento_caretaker_mut().stash(handler, fragment, 7u8);
                Ok(ctx.memento_caretaker().len())
            })
            .unwrap();

        assert_eq!(seen, 1);
        assert!(ctx.memento_caretaker().is_empty());
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scenario_d_parallel_runs_have_independent_fault_slots() {
        let delivery = Arc::new(
            DeliveryConfig::builder()
                .bind(
                    ResourceConfig::new("bad", "scripted"),
                    Arc::new(
                        Scripted::new(CapabilitySet::tree_all())
                            .failing_at(Capability::TreeBefore),
                    ),
                )
                .bind_visitor("*", Arc::new(Scripted::new(CapabilitySet::tree_all())))
                .build(),
        );
        let documents: Vec<Document> = (0..32)
            .map(|i| Document::new(if i % 3 == 0 { "bad" } else { "good" }))
            .collect();

        let outcomes = run_parallel(&documents, FilterMode::Tree, &delivery, |_, _| {});

        for outcome in &outcomes {
            let expect_fault = outcome.index % 3 == 0;
            assert_eq!(outcome.result.is_err(), expect_fault);
            assert_eq!(outcome.context.is_terminated(), expect_fault);
        }
    }

    #[test]
    fn same_document_in_both_modes_publishes_same_sequence() {
        let delivery = Arc::new(
            DeliveryConfig::builder()
                .bind_visitor("*", Arc::new(Scripted::new(
                    CapabilitySet::of(&[Capability::StreamBefore, Capability::StreamAfter])
                        .union(CapabilitySet::of(&[Capability::TreeBefore, Capability::TreeAfter])),
                )))
                .build(),
        );
        let mut document = Document::new("order");
        let root = document.root().id();
        document.append_element(root, "item").unwrap();

        let mut sequences = Vec::new();
        for mode in [FilterMode::Stream, FilterMode::Tree] {
            let mut ctx = ExecutionContext::new(Arc::clone(&delivery));
            let recorder = Arc::new(EventRecorder::new());
            ctx.set_event_listener(Arc::clone(&recorder));
            filter_document(&document, mode, &mut ctx).unwrap();
            sequences.push(
                recorder
                    .events()
                    .into_iter()
                    .map(|e| (e.kind, e.sequence, e.fragment_name))
                    .collect::<Vec<_>>(),
            );
        }

        assert_eq!(sequences[0], sequences[1]);
        assert_eq!(sequences[0].len(), 6);
    }
}
