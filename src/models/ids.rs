//! Entry identifier generation.
//!
//! New entries get `{slug}-{NNN}` ids, numbered per section. Bare `kpt_NNN`
//! ids exist only for entries migrated from the single-list format.

use super::{PlaybookEntry, Section};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches sectioned ids such as `pat-001` or `pref-1042`.
static SECTIONED_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]+)-(\d{3,})$").unwrap_or_else(|_| unreachable!("static pattern"))
});

/// Prefix of legacy migration ids.
pub const LEGACY_ID_PREFIX: &str = "kpt_";

/// Matches an id cited in square brackets, such as `[pat-001]` or `[kpt_004]`.
static CITED_ID: Lazy<Regex> = Lazy::new(|| {
    let slugs = Section::ALL.map(Section::slug);
    let pattern = format!(
        r"\[((?:{})-\d{{3,}}|{LEGACY_ID_PREFIX}\d{{3,}})\]",
        slugs.join("|")
    );
    Regex::new(&pattern).unwrap_or_else(|_| unreachable!("static pattern"))
});

/// Returns the entry ids cited in `texts`, each once, in first-cited order.
///
/// Only bracketed ids count, so prose mentioning `pat-001` without brackets
/// is ignored. Callers pass the agent's own messages; user messages would
/// count ids the agent never relied on.
#[must_use]
pub fn extract_cited_ids<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for text in texts {
        for id in CITED_ID
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

/// Returns the numeric suffix of `name` if it is a sectioned id for `slug`.
#[must_use]
pub fn sectioned_suffix(name: &str, slug: &str) -> Option<u64> {
    let caps = SECTIONED_ID.captures(name)?;
    if caps.get(1)?.as_str() != slug {
        return None;
    }
    caps.get(2)?.as_str().parse().ok()
}

/// Formats a sectioned id, zero-padding the number to three digits.
#[must_use]
pub fn format_sectioned_id(slug: &str, number: u64) -> String {
    format!("{slug}-{number:03}")
}

/// Generates the next id for a section.
///
/// Scans `entries` (the target section's entries) for ids of the form
/// `{slug}-NNN` and returns `{slug}-{max + 1}`. Names that do not follow this
/// form, including legacy `kpt_` ids, are ignored.
#[must_use]
pub fn generate_id(entries: &[PlaybookEntry], slug: &str) -> String {
    next_free_id(entries.iter().map(|e| e.name.as_str()), slug, |_| false)
}

/// Generates the next id for a section, skipping any candidate for which
/// `is_taken` returns true.
///
/// Used where the id must also be unique outside the target section.
pub fn next_free_id<'a>(
    section_names: impl IntoIterator<Item = &'a str>,
    slug: &str,
    is_taken: impl Fn(&str) -> bool,
) -> String {
    let start = section_names
        .into_iter()
        .filter_map(|name| sectioned_suffix(name, slug))
        .max()
        .map_or(1, |max| max.saturating_add(1));

    (start..=u64::MAX)
        .map(|n| format_sectioned_id(slug, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| format_sectioned_id(slug, u64::MAX))
}

/// Returns the number of a legacy `kpt_NNN` id.
#[must_use]
pub fn legacy_suffix(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(LEGACY_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Formats a legacy id.
#[must_use]
pub fn format_legacy_id(number: u64) -> String {
    format!("{LEGACY_ID_PREFIX}{number:03}")
}

/// Allocates legacy ids while migrating a single-list record.
///
/// Numbers continue from the highest legacy id seen so far in the list, and
/// skip any name reserved because it appears verbatim elsewhere in the list.
#[derive(Debug, Default)]
pub struct LegacyIdAllocator {
    highest: u64,
}

impl LegacyIdAllocator {
    /// Creates an allocator that has seen no ids yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { highest: 0 }
    }

    /// Records an explicit name encountered in the list.
    pub fn observe(&mut self, name: &str) {
        if let Some(n) = legacy_suffix(name) {
            self.highest = self.highest.max(n);
        }
    }

    /// Returns the next free legacy id and records it as seen.
    pub fn allocate(&mut self, is_reserved: impl Fn(&str) -> bool) -> String {
        let mut next = self.highest.saturating_add(1);
        let mut candidate = format_legacy_id(next);
        while is_reserved(&candidate) && next < u64::MAX {
            next += 1;
            candidate = format_legacy_id(next);
        }
        self.highest = next;
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn entries(names: &[&str]) -> Vec<PlaybookEntry> {
        names
            .iter()
            .map(|n| PlaybookEntry::new(*n, format!("text for {n}")))
            .collect()
    }

    #[test]
    fn test_first_id_in_empty_section() {
        assert_eq!(generate_id(&[], "pat"), "pat-001");
        assert_eq!(generate_id(&[], "pref"), "pref-001");
    }

    #[test]
    fn test_next_after_max_not_count() {
        let existing = entries(&["pat-001", "pat-007", "pat-003"]);
        assert_eq!(generate_id(&existing, "pat"), "pat-008");
    }

    #[test]
    fn test_ignores_other_slugs_and_legacy_ids() {
        let existing = entries(&["kpt_009", "mis-004", "42", "pat-1", "pat-01x", "xpat-005"]);
        assert_eq!(generate_id(&existing, "pat"), "pat-001");
    }

    #[test]
    fn test_grows_past_three_digits() {
        let existing = entries(&["ctx-999"]);
        assert_eq!(generate_id(&existing, "ctx"), "ctx-1000");
        let existing = entries(&["ctx-1000"]);
        assert_eq!(generate_id(&existing, "ctx"), "ctx-1001");
    }

    #[test]
    fn test_next_free_id_skips_taken() {
        let id = next_free_id(["oth-001"], "oth", |c| c == "oth-002" || c == "oth-003");
        assert_eq!(id, "oth-004");
    }

    #[test_case("kpt_001", Some(1))]
    #[test_case("kpt_1234", Some(1234))]
    #[test_case("kpt_", None)]
    #[test_case("kpt_12a", None)]
    #[test_case("pat-001", None)]
    fn test_legacy_suffix(name: &str, expected: Option<u64>) {
        assert_eq!(legacy_suffix(name), expected);
    }

    #[test]
    fn test_legacy_allocator_continues_from_seen() {
        let mut alloc = LegacyIdAllocator::new();
        assert_eq!(alloc.allocate(|_| false), "kpt_001");
        alloc.observe("kpt_005");
        assert_eq!(alloc.allocate(|_| false), "kpt_006");
    }

    #[test]
    fn test_legacy_allocator_skips_reserved() {
        let mut alloc = LegacyIdAllocator::new();
        let id = alloc.allocate(|c| c == "kpt_001");
        assert_eq!(id, "kpt_002");
        assert_eq!(alloc.allocate(|_| false), "kpt_003");
    }

    #[test]
    fn test_extract_cited_ids_in_order_without_repeats() {
        let ids = extract_cited_ids([
            "Based on [pat-001] and [mis-002], I recommend...",
            "Also applying [pat-001] here, and [pref-003] [ctx-004] [oth-005].",
        ]);
        assert_eq!(ids, vec!["pat-001", "mis-002", "pref-003", "ctx-004", "oth-005"]);
    }

    #[test]
    fn test_extract_cited_ids_legacy_ids() {
        assert_eq!(
            extract_cited_ids(["Following [kpt_001] and [oth-003], I suggest..."]),
            vec!["kpt_001", "oth-003"]
        );
    }

    #[test_case("Sure, here is the solution..." ; "no citation")]
    #[test_case("pat-001 without brackets" ; "bare id")]
    #[test_case("[foo-001] [pat-01] [kpt-001] [PAT-001]" ; "not entry ids")]
    fn test_extract_cited_ids_ignores(text: &str) {
        assert!(extract_cited_ids([text]).is_empty());
    }
}
