//! The playbook record.

use super::{PlaybookEntry, Section, ids};
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Record format version written on save.
pub const PLAYBOOK_VERSION: &str = "1.0";

/// Entries grouped by section.
///
/// Always holds exactly the five canonical sections. Serializes as a JSON
/// object keyed by canonical section name, in canonical order. Stored records
/// are read back through [`crate::storage::migrate_record`], which also
/// repairs records this type could not represent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sections {
    slots: [Vec<PlaybookEntry>; Section::COUNT],
}

impl Sections {
    /// Creates five empty sections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one section, in insertion order.
    #[must_use]
    pub fn get(&self, section: Section) -> &[PlaybookEntry] {
        &self.slots[section.index()]
    }

    /// Mutable entries of one section.
    pub fn get_mut(&mut self, section: Section) -> &mut Vec<PlaybookEntry> {
        &mut self.slots[section.index()]
    }

    /// Iterates sections in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &[PlaybookEntry])> {
        Section::ALL
            .into_iter()
            .map(move |section| (section, self.get(section)))
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Returns true if no section holds an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Section::COUNT))?;
        for (section, entries) in self.iter() {
            map.serialize_entry(section.name(), entries)?;
        }
        map.end()
    }
}

/// The whole playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playbook {
    /// Record format version.
    pub version: String,
    /// When the record was last saved (RFC 3339), or `None` if never saved.
    pub last_updated: Option<String>,
    /// Entries grouped by section.
    pub sections: Sections,
}

impl Default for Playbook {
    fn default() -> Self {
        Self {
            version: PLAYBOOK_VERSION.to_string(),
            last_updated: None,
            sections: Sections::new(),
        }
    }
}

impl Playbook {
    /// Creates an empty playbook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one section.
    #[must_use]
    pub fn entries(&self, section: Section) -> &[PlaybookEntry] {
        self.sections.get(section)
    }

    /// Appends an entry to a section without any checks.
    pub fn push(&mut self, section: Section, entry: PlaybookEntry) {
        self.sections.get_mut(section).push(entry);
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the playbook holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Locates an entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<(Section, usize)> {
        self.sections.iter().find_map(|(section, entries)| {
            entries
                .iter()
                .position(|e| e.name == name)
                .map(|idx| (section, idx))
        })
    }

    /// Returns the entry with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PlaybookEntry> {
        self.find(name)
            .map(|(section, idx)| &self.sections.get(section)[idx])
    }

    /// Returns the entry with the given name, mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PlaybookEntry> {
        let (section, idx) = self.find(name)?;
        self.sections.get_mut(section).get_mut(idx)
    }

    /// Returns true if any section holds an entry with this name.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Returns true if any section holds an entry with exactly this text.
    #[must_use]
    pub fn contains_text(&self, text: &str) -> bool {
        self.sections
            .iter()
            .any(|(_, entries)| entries.iter().any(|e| e.text == text))
    }

    /// Removes an entry by name, returning it with the section it was in.
    pub fn remove(&mut self, name: &str) -> Option<(Section, PlaybookEntry)> {
        let (section, idx) = self.find(name)?;
        Some((section, self.sections.get_mut(section).remove(idx)))
    }

    /// Keeps only the entries for which `keep` returns true.
    ///
    /// Returns the removed entries in canonical order.
    pub fn retain(
        &mut self,
        mut keep: impl FnMut(Section, &PlaybookEntry) -> bool,
    ) -> Vec<(Section, PlaybookEntry)> {
        let mut removed = Vec::new();
        for section in Section::ALL {
            let entries = std::mem::take(self.sections.get_mut(section));
            let (kept, dropped): (Vec<_>, Vec<_>) =
                entries.into_iter().partition(|e| keep(section, e));
            *self.sections.get_mut(section) = kept;
            removed.extend(dropped.into_iter().map(|e| (section, e)));
        }
        removed
    }

    /// All entries flattened in canonical section order, then insertion order.
    #[must_use]
    pub fn flatten(&self) -> Vec<(Section, &PlaybookEntry)> {
        self.sections
            .iter()
            .flat_map(|(section, entries)| entries.iter().map(move |e| (section, e)))
            .collect()
    }

    /// Allocates a fresh id for a new entry in `section`.
    ///
    /// Follows the per-section numbering and never returns a name already
    /// used anywhere in the playbook.
    #[must_use]
    pub fn allocate_id(&self, section: Section) -> String {
        let names = self.entries(section).iter().map(|e| e.name.as_str());
        ids::next_free_id(names, section.slug(), |candidate| {
            self.contains_name(candidate)
        })
    }

    /// Checks the structural invariants of the playbook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if two entries share a name or an
    /// entry has blank text.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.len());
        for (section, entry) in self.flatten() {
            if entry.text.trim().is_empty() {
                return Err(Error::OperationFailed {
                    operation: "validate_playbook".to_string(),
                    cause: format!("entry '{}' in {section} has blank text", entry.name),
                });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(Error::OperationFailed {
                    operation: "validate_playbook".to_string(),
                    cause: format!("duplicate entry name '{}'", entry.name),
                });
            }
        }
        Ok(())
    }
}
