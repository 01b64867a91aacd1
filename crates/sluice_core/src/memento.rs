//! Checkpoint and rollback of visitor run state.
//!
//! Visitors are shared between runs, so whatever state they accumulate during
//! one run is stashed in the run's [`MementoCaretaker`], keyed by the visitor's
//! [`HandlerId`] and the fragment the state belongs to. A [`Memento`] is a
//! snapshot of everything one visitor has stashed; restoring it puts that
//! visitor back exactly where it was when the snapshot was taken.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::trace;

use crate::{FragmentId, VisitSequence};

/// Identity of a visitor instance.
///
/// Derived from the visitor's address, which is stable because visitors are
/// held in an `Arc` for the lifetime of their delivery configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Returns the identity of `visitor`.
    pub fn of<V: ?Sized>(visitor: &V) -> Self {
        Self(std::ptr::from_ref(visitor).cast::<()>() as usize)
    }

    /// Creates an identity from a raw value.
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler@{:#x}", self.0)
    }
}

trait StateSlot: Any + Send {
    fn clone_slot(&self) -> Box<dyn StateSlot>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone + Send> StateSlot for T {
    fn clone_slot(&self) -> Box<dyn StateSlot> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type HandlerState = BTreeMap<FragmentId, Box<dyn StateSlot>>;

fn clone_state(state: &HandlerState) -> HandlerState {
    state
        .iter()
        .map(|(fragment, slot)| (*fragment, slot.clone_slot()))
        .collect()
}

/// Snapshot of one visitor's stashed state.
pub struct Memento {
    handler: HandlerId,
    fragment: FragmentId,
    sequence: VisitSequence,
    state: HandlerState,
}

impl Memento {
    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// The fragment at which the snapshot was taken.
    pub fn fragment(&self) -> FragmentId {
        self.fragment
    }

    pub fn sequence(&self) -> VisitSequence {
        self.sequence
    }

    /// Number of state entries captured.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl fmt::Debug for Memento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memento")
            .field("handler", &self.handler)
            .field("fragment", &self.fragment)
            .field("sequence", &self.sequence)
            .field("entries", &self.state.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Per-run store of visitor state with checkpoint/restore.
#[derive(Default)]
pub struct MementoCaretaker {
    states: HashMap<HandlerId, HandlerState>,
}

impl MementoCaretaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `state` for `handler` at `fragment`, replacing any previous value.
    pub fn stash<T: Any + Clone + Send>(
        &mut self,
        handler: HandlerId,
        fragment: FragmentId,
        state: T,
    ) {
        self.states
            .entry(handler)
            .or_default()
            .insert(fragment, Box::new(state));
    }

    /// Returns the state stored for `handler` at `fragment`, if it has type `T`.
    pub fn state<T: Any>(&self, handler: HandlerId, fragment: FragmentId) -> Option<&T> {
        self.states
            .get(&handler)?
            .get(&fragment)?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn state_mut<T: Any>(
        &mut self,
        handler: HandlerId,
        fragment: FragmentId,
    ) -> Option<&mut T> {
        self.states
            .get_mut(&handler)?
            .get_mut(&fragment)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn exists(&self, handler: HandlerId, fragment: FragmentId) -> bool {
        self.states
            .get(&handler)
            .is_some_and(|state| state.contains_key(&fragment))
    }

    /// Removes the state stored for `handler` at `fragment`.
    pub fn forget(&mut self, handler: HandlerId, fragment: FragmentId) -> bool {
        let Some(state) = self.states.get_mut(&handler) else {
            return false;
        };
        let removed = state.remove(&fragment).is_some();
        if state.is_empty() {
            self.states.remove(&handler);
        }
        removed
    }

    /// Total number of stored entries across all visitors.
    pub fn len(&self) -> usize {
        self.states.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Captures everything `handler` has stashed.
    pub fn checkpoint(
        &self,
        handler: HandlerId,
        fragment: FragmentId,
        sequence: VisitSequence,
    ) -> Memento {
        let state = self.states.get(&handler).map(clone_state).unwrap_or_default();
        trace!(%handler, %fragment, %sequence, entries = state.len(), "checkpoint");
        Memento {
            handler,
            fragment,
            sequence,
            state,
        }
    }

    /// Puts the memento's visitor back into the captured state.
    ///
    /// Entries stashed after the checkpoint are discarded. Restoring the same
    /// memento again yields the same state.
    pub fn restore(&mut self, memento: &Memento) {
        trace!(
            handler = %memento.handler,
            fragment = %memento.fragment,
            entries = memento.state.len(),
            "restore"
        );
        if memento.state.is_empty() {
            self.states.remove(&memento.handler);
        } else {
            self.states.insert(memento.handler, clone_state(&memento.state));
        }
    }
}

impl fmt::Debug for MementoCaretaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.states
                    .iter()
                    .map(|(handler, state)| (handler, state.keys().collect::<Vec<_>>())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_ast::NodeId;

    const H1: HandlerId = HandlerId::from_raw(1);
    const H2: HandlerId = HandlerId::from_raw(2);
    const F1: FragmentId = FragmentId::Stream(1);
    const F2: FragmentId = FragmentId::Stream(2);

    #[test]
    fn test_stash_and_read() {
        let mut caretaker = MementoCaretaker::new();
        caretaker.stash(H1, F1, String::from("abc"));

        assert_eq!(caretaker.state::<String>(H1, F1).map(String::as_str), Some("abc"));
        assert!(caretaker.state::<u32>(H1, F1).is_none());
        assert!(caretaker.state::<String>(H2, F1).is_none());
        assert!(caretaker.exists(H1, F1));
        assert_eq!(caretaker.len(), 1);
    }

    #[test]
    fn test_state_mut() {
        let mut caretaker = MementoCaretaker::new();
        caretaker.stash(H1, F1, 1u32);
        *caretaker.state_mut::<u32>(H1, F1).unwrap() += 41;

        assert_eq!(caretaker.state::<u32>(H1, F1), Some(&42));
    }

    #[test]
    fn test_forget() {
        let mut caretaker = MementoCaretaker::new();
        caretaker.stash(H1, F1, 1u32);

        assert!(caretaker.forget(H1, F1));
        assert!(!caretaker.forget(H1, F1));
        assert!(caretaker.is_empty());
    }

    #[test]
    fn test_restore_rolls_back_changes() {
        let mut caretaker = MementoCaretaker::new();
        caretaker.stash(H1, F1, vec![1, 2]);
        let memento = caretaker.checkpoint(H1, F1, VisitSequence::Before);

        caretaker.state_mut::<Vec<i32>>(H1, F1).unwrap().push(3);
        caretaker.stash(H1, F2, 9u8);
        caretaker.restore(&memento);

        assert_eq!(caretaker.state::<Vec<i32>>(H1, F1), Some(&vec![1, 2]));
        assert!(!caretaker.exists(H1, F2));
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut caretaker = MementoCaretaker::new();
        caretaker.stash(H1, F1, 5u64);
        let memento = caretaker.checkpoint(H1, F1, VisitSequence::After);

        caretaker.restore(&memento);
        let once = caretaker.state::<u64>(H1, F1).copied();
        caretaker.restore(&memento);
        let twice = caretaker.state::<u64>(H1, F1).copied();

        assert_eq!(once, Some(5));
        assert_eq!(once, twice);
        assert_eq!(caretaker.len(), 1);
    }

    #[test]
    fn test_restore_leaves_other_handlers_alone() {
        let mut caretaker = MementoCaretaker::new();
        let memento = caretaker.checkpoint(H1, F1, VisitSequence::Before);
        caretaker.stash(H1, F1, 1u8);
        caretaker.stash(H2, F1, 2u8);

        caretaker.restore(&memento);

        assert!(!caretaker.exists(H1, F1));
        assert_eq!(caretaker.state::<u8>(H2, F1), Some(&2));
    }

    #[test]
    fn test_memento_metadata() {
        let mut caretaker = MementoCaretaker::new();
        let fragment = FragmentId::Node(NodeId::ROOT);
        caretaker.stash(H2, fragment, ());
        let memento = caretaker.checkpoint(H2, fragment, VisitSequence::After);

        assert_eq!(memento.handler(), H2);
        assert_eq!(memento.fragment(), fragment);
        assert_eq!(memento.sequence(), VisitSequence::After);
        assert_eq!(memento.len(), 1);
    }

    #[test]
    fn test_handler_id_of_same_instance() {
        let value = String::from("visitor");
        let as_dyn: &dyn std::fmt::Debug = &value;

        assert_eq!(HandlerId::of(&value), HandlerId::of(as_dyn));
    }
}
