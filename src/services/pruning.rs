//! Eviction of entries with disproportionate harmful feedback.

use crate::models::{Playbook, PlaybookEntry, Section};

/// Harmful count at which an entry becomes eligible for pruning.
pub const PRUNE_MIN_HARMFUL: u32 = 3;

/// Returns true if the entry should be evicted.
///
/// An entry is pruned when `harmful >= 3` and `harmful > helpful`. Entries
/// that were never evaluated are always kept.
#[must_use]
pub const fn should_prune(entry: &PlaybookEntry) -> bool {
    entry.harmful >= PRUNE_MIN_HARMFUL && entry.harmful > entry.helpful
}

/// Removes every entry matching [`should_prune`].
///
/// Returns the removed entries with their sections, in canonical order.
pub fn prune(playbook: &mut Playbook) -> Vec<(Section, PlaybookEntry)> {
    let removed = playbook.retain(|_, entry| !should_prune(entry));
    for (section, entry) in &removed {
        tracing::info!(
            name = %entry.name,
            section = %section,
            helpful = entry.helpful,
            harmful = entry.harmful,
            "Pruned harmful entry"
        );
    }
    if !removed.is_empty() {
        metrics::counter!("playbook_entries_pruned_total").increment(removed.len() as u64);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 2, false ; "below harmful floor")]
    #[test_case(0, 3, true ; "at harmful floor")]
    #[test_case(3, 3, false ; "equal counters")]
    #[test_case(10, 4, false ; "helpful dominates")]
    #[test_case(2, 5, true ; "harmful dominates")]
    #[test_case(0, 0, false ; "never evaluated")]
    fn test_prune_boundary(helpful: u32, harmful: u32, pruned: bool) {
        let entry = PlaybookEntry::new("x", "t").with_counters(helpful, harmful);
        assert_eq!(should_prune(&entry), pruned);
    }

    #[test]
    fn test_prune_removes_across_sections() {
        let mut playbook = Playbook::new();
        playbook.push(Section::Patterns, PlaybookEntry::new("pat-001", "keep"));
        playbook.push(
            Section::Patterns,
            PlaybookEntry::new("pat-002", "drop").with_counters(1, 4),
        );
        playbook.push(
            Section::Others,
            PlaybookEntry::new("oth-001", "drop too").with_counters(0, 3),
        );

        let removed = prune(&mut playbook);
        let names: Vec<_> = removed.iter().map(|(_, e)| e.name.as_str()).collect();
        assert_eq!(names, vec!["pat-002", "oth-001"]);
        assert_eq!(playbook.len(), 1);
        assert!(playbook.contains_name("pat-001"));
    }
}
