//! Playbook entries.

use serde::{Deserialize, Serialize};

/// One key point in the playbook.
///
/// Only these four fields are ever persisted. Counters are unsigned so a
/// negative value cannot be represented once an entry has been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookEntry {
    /// Opaque identifier, unique across the whole playbook.
    pub name: String,
    /// The insight itself.
    pub text: String,
    /// Times the entry was rated helpful.
    #[serde(default)]
    pub helpful: u32,
    /// Times the entry was rated harmful.
    #[serde(default)]
    pub harmful: u32,
}

impl PlaybookEntry {
    /// Creates an entry with zeroed counters.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            helpful: 0,
            harmful: 0,
        }
    }

    /// Sets both counters.
    #[must_use]
    pub const fn with_counters(mut self, helpful: u32, harmful: u32) -> Self {
        self.helpful = helpful;
        self.harmful = harmful;
        self
    }

    /// Returns true if the entry has never been evaluated.
    #[must_use]
    pub const fn is_unevaluated(&self) -> bool {
        self.helpful == 0 && self.harmful == 0
    }

    /// Adds another entry's counters to this one.
    pub const fn absorb_counters(&mut self, other: &Self) {
        self.helpful = self.helpful.saturating_add(other.helpful);
        self.harmful = self.harmful.saturating_add(other.harmful);
    }
}
