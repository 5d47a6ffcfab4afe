//! Reconciliation of persisted records into a [`Playbook`].
//!
//! Two on-disk shapes exist. The current one keys entries by section under
//! `sections`. The legacy one is a flat `key_points` list whose elements may be
//! bare strings or objects carrying a signed `score` instead of counters.
//! Whatever the input, the result satisfies the playbook invariants: five
//! sections, unsigned counters, no `score`, unique non-blank names.

use crate::models::ids::{self, LegacyIdAllocator};
use crate::models::{
    PLAYBOOK_VERSION, Playbook, PlaybookEntry, Section, SectionResolution, resolve_section,
};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Shape of the record that was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// No record on disk.
    #[default]
    Missing,
    /// The file could not be read or parsed.
    Unreadable,
    /// A record with a `sections` object.
    Current,
    /// A record with a flat `key_points` list.
    Legacy,
    /// Valid JSON with neither key.
    Unrecognized,
}

impl RecordFormat {
    /// Lowercase label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Unreadable => "unreadable",
            Self::Current => "current",
            Self::Legacy => "legacy",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// What reconciliation had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Detected record shape.
    pub format: RecordFormat,
    /// Entries in the resulting playbook.
    pub entries_loaded: usize,
    /// Elements dropped for lacking usable text.
    pub dropped_entries: usize,
    /// Non-canonical section keys folded into OTHERS.
    pub folded_sections: Vec<String>,
    /// Canonical sections absent from the record.
    pub added_sections: Vec<Section>,
    /// Entries that received a new name, as `(old, new)`; `old` is empty when
    /// the entry had none.
    pub renamed: Vec<(String, String)>,
    /// Entries whose `score` was converted into counters.
    pub scores_converted: usize,
    /// A stray `key_points` key was ignored next to `sections`.
    pub ignored_key_points: bool,
}

impl MigrationReport {
    pub(crate) const fn with_format(format: RecordFormat) -> Self {
        Self {
            format,
            entries_loaded: 0,
            dropped_entries: 0,
            folded_sections: Vec::new(),
            added_sections: Vec::new(),
            renamed: Vec::new(),
            scores_converted: 0,
            ignored_key_points: false,
        }
    }

    /// Returns true if the loaded playbook differs in shape from the record.
    #[must_use]
    pub fn changed_record(&self) -> bool {
        self.format == RecordFormat::Legacy
            || self.dropped_entries > 0
            || self.scores_converted > 0
            || self.ignored_key_points
            || !self.folded_sections.is_empty()
            || !self.renamed.is_empty()
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "format: {}", self.format.as_str())?;
        writeln!(f, "entries loaded: {}", self.entries_loaded)?;
        writeln!(f, "entries dropped: {}", self.dropped_entries)?;
        writeln!(f, "scores converted: {}", self.scores_converted)?;
        writeln!(f, "stray key_points ignored: {}", self.ignored_key_points)?;
        if !self.added_sections.is_empty() {
            let names: Vec<_> = self.added_sections.iter().map(|s| s.name()).collect();
            writeln!(f, "sections added: {}", names.join(", "))?;
        }
        if !self.folded_sections.is_empty() {
            writeln!(f, "sections folded into OTHERS: {}", self.folded_sections.join(", "))?;
        }
        for (old, new) in &self.renamed {
            let old = if old.is_empty() { "<none>" } else { old.as_str() };
            writeln!(f, "renamed: {old} -> {new}")?;
        }
        Ok(())
    }
}

/// An entry read from the record before its name is settled.
#[derive(Debug)]
struct PendingEntry {
    name: Option<String>,
    text: String,
    helpful: u32,
    harmful: u32,
    keeps_name: bool,
}

/// Reconciles a parsed record into a playbook.
#[must_use]
pub fn migrate_record(record: &Value) -> (Playbook, MigrationReport) {
    let Some(obj) = record.as_object() else {
        return (
            Playbook::new(),
            MigrationReport::with_format(RecordFormat::Unrecognized),
        );
    };

    let version = obj
        .get("version")
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(PLAYBOOK_VERSION)
        .to_string();
    let last_updated = obj
        .get("last_updated")
        .and_then(Value::as_str)
        .map(str::to_string);

    let (mut playbook, mut report) = if let Some(sections) = obj.get("sections") {
        let mut report = MigrationReport::with_format(RecordFormat::Current);
        report.ignored_key_points = obj.contains_key("key_points");
        (migrate_sections(sections, &mut report), report)
    } else if let Some(key_points) = obj.get("key_points").and_then(Value::as_array) {
        let mut report = MigrationReport::with_format(RecordFormat::Legacy);
        (migrate_key_points(key_points, &mut report), report)
    } else {
        return (
            Playbook::new(),
            MigrationReport::with_format(RecordFormat::Unrecognized),
        );
    };

    playbook.version = version;
    playbook.last_updated = last_updated;
    report.entries_loaded = playbook.len();
    (playbook, report)
}

/// Current format: entries keyed by section name.
fn migrate_sections(sections: &Value, report: &mut MigrationReport) -> Playbook {
    let empty = Map::new();
    let sections = sections.as_object().unwrap_or_else(|| {
        tracing::warn!("Playbook 'sections' is not an object; starting from empty sections");
        &empty
    });

    let mut present = [false; Section::COUNT];
    let mut pending: [Vec<PendingEntry>; Section::COUNT] = Default::default();
    for (key, items) in sections {
        let resolution = resolve_section(Some(key.as_str()));
        if let SectionResolution::Matched(section) = resolution {
            present[section.index()] = true;
        } else {
            tracing::warn!(section = %key, "Folding unknown playbook section into OTHERS");
            report.folded_sections.push(key.clone());
        }
        let Some(items) = items.as_array() else {
            tracing::warn!(section = %key, "Section is not a list; ignoring its contents");
            continue;
        };
        let slot = &mut pending[resolution.section().index()];
        for item in items {
            match pending_from_item(item, report) {
                Some(entry) => slot.push(entry),
                None => report.dropped_entries += 1,
            }
        }
    }

    report.added_sections = Section::ALL
        .into_iter()
        .filter(|section| !present[section.index()])
        .collect();

    settle_sectioned_names(pending, report)
}

/// Gives every entry a unique name. First occurrences of explicit names keep
/// them; missing and repeated names get a fresh sectioned id.
fn settle_sectioned_names(
    mut pending: [Vec<PendingEntry>; Section::COUNT],
    report: &mut MigrationReport,
) -> Playbook {
    let mut taken: HashSet<String> = HashSet::new();
    for entry in pending.iter_mut().flatten() {
        if let Some(name) = &entry.name {
            entry.keeps_name = taken.insert(name.clone());
        }
    }

    let mut playbook = Playbook::new();
    for section in Section::ALL {
        let entries = std::mem::take(&mut pending[section.index()]);
        let mut section_names: Vec<String> = entries
            .iter()
            .filter(|e| e.keeps_name)
            .filter_map(|e| e.name.clone())
            .collect();

        for entry in entries {
            let name = match entry.name {
                Some(name) if entry.keeps_name => name,
                old => {
                    let fresh = ids::next_free_id(
                        section_names.iter().map(String::as_str),
                        section.slug(),
                        |candidate| taken.contains(candidate),
                    );
                    taken.insert(fresh.clone());
                    section_names.push(fresh.clone());
                    report.renamed.push((old.unwrap_or_default(), fresh.clone()));
                    fresh
                },
            };
            playbook.push(
                section,
                PlaybookEntry::new(name, entry.text).with_counters(entry.helpful, entry.harmful),
            );
        }
    }
    playbook
}

/// Legacy format: one flat list, migrated into OTHERS with `kpt_` names.
fn migrate_key_points(items: &[Value], report: &mut MigrationReport) -> Playbook {
    let reserved: HashSet<&str> = items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .collect();

    let mut allocator = LegacyIdAllocator::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut playbook = Playbook::new();

    for item in items {
        let Some(entry) = pending_from_item(item, report) else {
            report.dropped_entries += 1;
            continue;
        };

        let name = match entry.name {
            Some(name) if !taken.contains(&name) => {
                allocator.observe(&name);
                name
            },
            old => {
                let fresh = allocator
                    .allocate(|candidate| reserved.contains(candidate) || taken.contains(candidate));
                if let Some(old) = old {
                    report.renamed.push((old, fresh.clone()));
                }
                fresh
            },
        };

        taken.insert(name.clone());
        playbook.push(
            Section::Others,
            PlaybookEntry::new(name, entry.text).with_counters(entry.helpful, entry.harmful),
        );
    }
    playbook
}

/// Reads one list element. Returns `None` if it carries no usable text.
fn pending_from_item(item: &Value, report: &mut MigrationReport) -> Option<PendingEntry> {
    match item {
        Value::String(text) if !text.trim().is_empty() => Some(PendingEntry {
            name: None,
            text: text.clone(),
            helpful: 0,
            harmful: 0,
            keeps_name: false,
        }),
        Value::Object(obj) => {
            let Some(text) = obj
                .get("text")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
            else {
                let name = obj.get("name").and_then(Value::as_str).unwrap_or_default();
                tracing::warn!(name, "Dropping playbook entry without text");
                return None;
            };
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string);
            let (helpful, harmful, from_score) = read_counters(obj);
            if from_score {
                report.scores_converted += 1;
            }
            Some(PendingEntry {
                name,
                text: text.to_string(),
                helpful,
                harmful,
                keeps_name: false,
            })
        },
        _ => None,
    }
}

/// Reads `(helpful, harmful, converted_from_score)`.
///
/// Explicit counters win; a missing one defaults to zero. Without either
/// counter, a signed `score` splits into `helpful = max(score, 0)` and
/// `harmful = max(-score, 0)`.
fn read_counters(obj: &Map<String, Value>) -> (u32, u32, bool) {
    let helpful = obj.get("helpful").filter(|v| !v.is_null());
    let harmful = obj.get("harmful").filter(|v| !v.is_null());

    if helpful.is_some() || harmful.is_some() {
        return (
            helpful.map_or(0, clamp_counter),
            harmful.map_or(0, clamp_counter),
            false,
        );
    }

    match obj.get("score").and_then(score_value) {
        Some(score) => (
            saturate(score.max(0)),
            saturate(score.saturating_neg().max(0)),
            true,
        ),
        None => (0, 0, false),
    }
}

/// Converts a counter value to `u32`, flooring negatives and non-numbers at 0.
fn clamp_counter(value: &Value) -> u32 {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).unwrap_or(u32::MAX);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f > 0.0)
        .map_or(0, |f| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = f.min(f64::from(u32::MAX)) as u32;
            n
        })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn score_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

fn saturate(n: i64) -> u32 {
    u32::try_from(n).unwrap_or(if n < 0 { 0 } else { u32::MAX })
}
