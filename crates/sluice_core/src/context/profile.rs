//! Target profile sets.

use std::collections::BTreeSet;

/// Profile used when a run does not name one.
pub const DEFAULT_PROFILE: &str = "default";

/// The set of profiles a run is targeted at. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSet {
    base_profile: String,
    profiles: BTreeSet<String>,
}

impl ProfileSet {
    /// Creates a profile set. The base profile is always a member.
    pub fn new(
        base_profile: impl Into<String>,
        profiles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let base_profile = base_profile.into();
        let mut members: BTreeSet<String> = profiles.into_iter().map(Into::into).collect();
        members.insert(base_profile.clone());
        Self {
            base_profile,
            profiles: members,
        }
    }

    pub fn base_profile(&self) -> &str {
        &self.base_profile
    }

    pub fn is_member(&self, profile: &str) -> bool {
        self.profiles.contains(profile)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE, std::iter::empty::<String>())
    }
}
