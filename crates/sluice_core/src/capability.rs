//! Capability markers.
//!
//! A capability names one callback role of one document representation. A
//! visitor declares the set it supports through [`Visitor::capabilities`]; the
//! dispatch core uses that set to decide whether a callback site is
//! observable, never whether the callback runs.
//!
//! [`Visitor::capabilities`]: crate::Visitor::capabilities

use std::fmt;

use serde::Serialize;

/// Document representation a capability belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    Stream,
    Tree,
}

/// Whether a visitation corresponds to entry or exit processing of a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitSequence {
    Before,
    After,
}

impl fmt::Display for VisitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VisitSequence::Before => "before",
            VisitSequence::After => "after",
        })
    }
}

/// One callback role of one representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    StreamBefore,
    StreamAfter,
    StreamChildText,
    StreamChildElement,
    TreeBefore,
    TreeAfter,
    TreeChildText,
    TreeChildElement,
}

impl Capability {
    /// Every capability, streaming first.
    pub const ALL: [Capability; 8] = [
        Capability::StreamBefore,
        Capability::StreamAfter,
        Capability::StreamChildText,
        Capability::StreamChildElement,
        Capability::TreeBefore,
        Capability::TreeAfter,
        Capability::TreeChildText,
        Capability::TreeChildElement,
    ];

    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// Returns the representation this capability belongs to.
    pub const fn representation(self) -> Representation {
        match self {
            Capability::StreamBefore
            | Capability::StreamAfter
            | Capability::StreamChildText
            | Capability::StreamChildElement => Representation::Stream,
            Capability::TreeBefore
            | Capability::TreeAfter
            | Capability::TreeChildText
            | Capability::TreeChildElement => Representation::Tree,
        }
    }

    /// Returns the sequence reported for visitations of this capability.
    ///
    /// Child callbacks are reported as `After`: they evidence work done on
    /// content the fragment already contains.
    pub const fn sequence(self) -> VisitSequence {
        match self {
            Capability::StreamBefore | Capability::TreeBefore => VisitSequence::Before,
            _ => VisitSequence::After,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::StreamBefore => "stream-before",
            Capability::StreamAfter => "stream-after",
            Capability::StreamChildText => "stream-child-text",
            Capability::StreamChildElement => "stream-child-element",
            Capability::TreeBefore => "tree-before",
            Capability::TreeAfter => "tree-after",
            Capability::TreeChildText => "tree-child-text",
            Capability::TreeChildElement => "tree-child-element",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of capabilities.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    pub const EMPTY: CapabilitySet = CapabilitySet(0);

    /// Creates a set from a slice of capabilities.
    pub const fn of(capabilities: &[Capability]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < capabilities.len() {
            bits |= capabilities[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// All four streaming capabilities.
    pub const fn stream_all() -> Self {
        Self::of(&[
            Capability::StreamBefore,
            Capability::StreamAfter,
            Capability::StreamChildText,
            Capability::StreamChildElement,
        ])
    }

    /// All four tree capabilities.
    pub const fn tree_all() -> Self {
        Self::of(&[
            Capability::TreeBefore,
            Capability::TreeAfter,
            Capability::TreeChildText,
            Capability::TreeChildElement,
        ])
    }

    /// Returns a copy of this set with `capability` added.
    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Returns the union of two sets.
    #[must_use]
    pub const fn union(self, other: CapabilitySet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    #[inline]
    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the members in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
