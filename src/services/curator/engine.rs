//! Curator batch application.

use super::{CurationReport, CuratorConfig, OperationOutcome, SkipReason};
use crate::models::{
    NewKeyPoint, Operation, Playbook, PlaybookEntry, Section, resolve_section_logged,
};
use crate::{Error, Result};
use tracing::instrument;

/// Result of running a batch.
///
/// On success `playbook` is the updated state. If a defect interrupted the
/// batch, `playbook` is the untouched input and `rollback` holds the error.
#[derive(Debug)]
pub struct CurationOutcome {
    /// The playbook after the batch (or the original on rollback).
    pub playbook: Playbook,
    /// What each processed operation did.
    pub report: CurationReport,
    /// The error that discarded the batch, if any.
    pub rollback: Option<Error>,
}

impl CurationOutcome {
    /// Returns true if the batch was committed.
    #[must_use]
    pub const fn committed(&self) -> bool {
        self.rollback.is_none()
    }
}

/// Applies ordered batches of curator operations.
///
/// Each batch runs against a private copy of the playbook. Invalid operations
/// are skipped and the batch continues; only an internal failure discards the
/// whole batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CuratorEngine {
    config: CuratorConfig,
}

impl CuratorEngine {
    /// Creates an engine.
    #[must_use]
    pub const fn new(config: CuratorConfig) -> Self {
        Self { config }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &CuratorConfig {
        &self.config
    }

    /// Applies a batch of operations.
    ///
    /// Only the first `max_operations` operations are considered. Operations
    /// see the effects of earlier ones in the same batch.
    #[instrument(skip_all, fields(operations = operations.len()))]
    pub fn apply_operations(&self, playbook: Playbook, operations: &[Operation]) -> CurationOutcome {
        if operations.is_empty() {
            return CurationOutcome {
                playbook,
                report: CurationReport::new(0, 0),
                rollback: None,
            };
        }

        let limit = self.config.max_operations;
        let batch = if operations.len() > limit {
            tracing::warn!(
                received = operations.len(),
                limit,
                "Truncating curator batch"
            );
            metrics::counter!("curator_operations_truncated_total")
                .increment((operations.len() - limit) as u64);
            &operations[..limit]
        } else {
            operations
        };

        run_batch(playbook, batch, operations.len())
    }

    /// Applies legacy key point proposals with ADD semantics.
    ///
    /// No truncation applies to this path.
    #[instrument(skip_all, fields(key_points = points.len()))]
    pub fn apply_new_key_points(&self, playbook: Playbook, points: &[NewKeyPoint]) -> CurationOutcome {
        let operations: Vec<Operation> = points
            .iter()
            .map(|point| Operation::Add {
                text: point.text.clone(),
                section: point.section.clone(),
            })
            .collect();
        run_batch(playbook, &operations, operations.len())
    }
}

fn run_batch(playbook: Playbook, batch: &[Operation], received: usize) -> CurationOutcome {
    let mut report = CurationReport::new(received, batch.len());

    match apply_batch(&playbook, batch, &mut report) {
        Ok(updated) => {
            tracing::info!(
                applied = report.applied(),
                skipped = report.skipped(),
                "Curator batch committed"
            );
            CurationOutcome {
                playbook: updated,
                report,
                rollback: None,
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Curator batch failed, keeping original playbook");
            metrics::counter!("curator_batches_rolled_back_total").increment(1);
            CurationOutcome {
                playbook,
                report,
                rollback: Some(e),
            }
        },
    }
}

/// Applies every operation to a copy of `original`.
fn apply_batch(
    original: &Playbook,
    batch: &[Operation],
    report: &mut CurationReport,
) -> Result<Playbook> {
    let mut working = original.clone();
    for operation in batch {
        let outcome = apply_operation(&mut working, operation)?;
        working.validate()?;

        let status = if outcome.is_applied() {
            tracing::info!(outcome = %outcome, "Applied curator operation");
            "applied"
        } else {
            tracing::info!(outcome = %outcome, "Skipped curator operation");
            "skipped"
        };
        metrics::counter!(
            "curator_operations_total",
            "operation" => operation.label(),
            "status" => status
        )
        .increment(1);
        report.outcomes.push(outcome);
    }
    Ok(working)
}

/// Applies one operation in place.
///
/// Validation failures become [`OperationOutcome::Skipped`]; an `Err` means
/// the playbook was found in a state the operation cannot handle.
pub(crate) fn apply_operation(
    playbook: &mut Playbook,
    operation: &Operation,
) -> Result<OperationOutcome> {
    match operation {
        Operation::Add { text, section } => Ok(apply_add(playbook, text, section.as_deref())),
        Operation::Merge {
            source_ids,
            merged_text,
            section,
        } => apply_merge(playbook, source_ids, merged_text, section.as_deref()),
        Operation::Update { target_id, text } => Ok(apply_update(playbook, target_id, text)),
        Operation::Delete { target_id, reason } => {
            Ok(apply_delete(playbook, target_id, reason.as_deref()))
        },
        Operation::Unknown { kind } => Ok(skipped(
            operation.label(),
            SkipReason::UnknownType(kind.clone()),
        )),
    }
}

const fn skipped(operation: &'static str, reason: SkipReason) -> OperationOutcome {
    OperationOutcome::Skipped { operation, reason }
}

fn apply_add(playbook: &mut Playbook, text: &str, section: Option<&str>) -> OperationOutcome {
    let text = text.trim();
    if text.is_empty() {
        return skipped("ADD", SkipReason::BlankText);
    }
    if playbook.contains_text(text) {
        return skipped("ADD", SkipReason::DuplicateText);
    }

    let section = resolve_section_logged(section);
    let name = playbook.allocate_id(section);
    playbook.push(section, PlaybookEntry::new(name.clone(), text));
    OperationOutcome::Added { name, section }
}

fn apply_merge(
    playbook: &mut Playbook,
    source_ids: &[String],
    merged_text: &str,
    section: Option<&str>,
) -> Result<OperationOutcome> {
    if source_ids.len() < 2 {
        return Ok(skipped(
            "MERGE",
            SkipReason::TooFewSources {
                given: source_ids.len(),
            },
        ));
    }
    let merged_text = merged_text.trim();
    if merged_text.is_empty() {
        return Ok(skipped("MERGE", SkipReason::BlankText));
    }

    let mut unique: Vec<&str> = Vec::with_capacity(source_ids.len());
    for id in source_ids.iter().map(|id| id.trim()) {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    let (valid, missing): (Vec<&str>, Vec<&str>) =
        unique.into_iter().partition(|id| playbook.contains_name(id));
    for id in &missing {
        tracing::warn!(source_id = %id, "Merge source not found, ignoring");
    }
    let missing: Vec<String> = missing.into_iter().map(str::to_string).collect();

    let Some(first) = valid.first().copied().filter(|_| valid.len() >= 2) else {
        return Ok(skipped(
            "MERGE",
            SkipReason::TooFewValidSources {
                valid: valid.len(),
                missing,
            },
        ));
    };

    let target = match section.filter(|s| !s.trim().is_empty()) {
        Some(raw) => resolve_section_logged(Some(raw)),
        None => section_of(playbook, first, "merge")?,
    };

    // The new id is allocated while the sources still exist.
    let name = playbook.allocate_id(target);
    let mut merged = PlaybookEntry::new(name.clone(), merged_text);
    for id in &valid {
        let (_, source) = playbook.remove(id).ok_or_else(|| Error::OperationFailed {
            operation: "merge".to_string(),
            cause: format!("source '{id}' vanished during merge"),
        })?;
        merged.absorb_counters(&source);
    }
    playbook.push(target, merged);

    Ok(OperationOutcome::Merged {
        name,
        section: target,
        sources: valid.into_iter().map(str::to_string).collect(),
        missing,
    })
}

fn apply_update(playbook: &mut Playbook, target_id: &str, text: &str) -> OperationOutcome {
    let target_id = target_id.trim();
    if target_id.is_empty() {
        return skipped("UPDATE", SkipReason::BlankTarget);
    }
    let text = text.trim();
    if text.is_empty() {
        return skipped("UPDATE", SkipReason::BlankText);
    }

    match playbook.get_mut(target_id) {
        Some(entry) => {
            entry.text = text.to_string();
            OperationOutcome::Updated {
                name: target_id.to_string(),
            }
        },
        None => skipped("UPDATE", SkipReason::TargetNotFound(target_id.to_string())),
    }
}

fn apply_delete(playbook: &mut Playbook, target_id: &str, reason: Option<&str>) -> OperationOutcome {
    let target_id = target_id.trim();
    if target_id.is_empty() {
        return skipped("DELETE", SkipReason::BlankTarget);
    }

    match playbook.remove(target_id) {
        Some((section, removed)) => OperationOutcome::Deleted {
            name: target_id.to_string(),
            section,
            text: removed.text,
            reason: reason.map(str::to_string),
        },
        None => skipped("DELETE", SkipReason::TargetNotFound(target_id.to_string())),
    }
}

fn section_of(playbook: &Playbook, name: &str, operation: &str) -> Result<Section> {
    playbook
        .find(name)
        .map(|(section, _)| section)
        .ok_or_else(|| Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("entry '{name}' disappeared"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Section;

    fn add(text: &str, section: Option<&str>) -> Operation {
        Operation::Add {
            text: text.to_string(),
            section: section.map(str::to_string),
        }
    }

    fn merge(ids: &[&str], text: &str, section: Option<&str>) -> Operation {
        Operation::Merge {
            source_ids: ids.iter().map(|s| (*s).to_string()).collect(),
            merged_text: text.to_string(),
            section: section.map(str::to_string),
        }
    }

    fn seeded() -> Playbook {
        let mut playbook = Playbook::new();
        playbook.push(
            Section::Patterns,
            PlaybookEntry::new("pat-001", "first").with_counters(5, 1),
        );
        playbook.push(
            Section::Patterns,
            PlaybookEntry::new("pat-002", "second").with_counters(3, 0),
        );
        playbook.push(
            Section::Mistakes,
            PlaybookEntry::new("mis-001", "oops").with_counters(0, 2),
        );
        playbook
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(seeded(), &[]);
        assert!(outcome.committed());
        assert_eq!(outcome.playbook, seeded());
        assert_eq!(outcome.report, CurationReport::new(0, 0));
    }

    #[test]
    fn test_add_trims_and_allocates() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(seeded(), &[add("  third  ", Some("patterns & approaches"))]);
        let entries = outcome.playbook.entries(Section::Patterns);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].name, "pat-003");
        assert_eq!(entries[2].text, "third");
        assert!(entries[2].is_unevaluated());
    }

    #[test]
    fn test_add_skips_blank_and_global_duplicates() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(
            seeded(),
            &[add("   ", None), add("oops", Some("OTHERS")), add("new", Some("made up"))],
        );
        assert_eq!(outcome.report.skipped(), 2);
        assert_eq!(
            outcome.report.outcomes[0],
            OperationOutcome::Skipped {
                operation: "ADD",
                reason: SkipReason::BlankText
            }
        );
        assert_eq!(outcome.playbook.entries(Section::Others)[0].name, "oth-001");
        assert_eq!(outcome.playbook.len(), 4);
    }

    #[test]
    fn test_merge_sums_counters_and_removes_sources() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(seeded(), &[merge(&["pat-001", "pat-002"], "X", None)]);
        let playbook = outcome.playbook;
        assert!(!playbook.contains_name("pat-001"));
        assert!(!playbook.contains_name("pat-002"));
        let merged = playbook.get("pat-003").unwrap();
        assert_eq!((merged.helpful, merged.harmful), (8, 1));
        assert_eq!(merged.text, "X");
        assert_eq!(playbook.find("pat-003").unwrap().0, Section::Patterns);
    }

    #[test]
    fn test_merge_explicit_section_and_missing_sources() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(
            seeded(),
            &[merge(&["mis-001", "ghost", "pat-002"], "combined", Some("project context"))],
        );
        match &outcome.report.outcomes[0] {
            OperationOutcome::Merged {
                name,
                section,
                sources,
                missing,
            } => {
                assert_eq!(name, "ctx-001");
                assert_eq!(*section, Section::ProjectContext);
                assert_eq!(sources, &vec!["mis-001".to_string(), "pat-002".to_string()]);
                assert_eq!(missing, &vec!["ghost".to_string()]);
            },
            other => panic!("unexpected outcome {other:?}"),
        }
        let merged = outcome.playbook.get("ctx-001").unwrap();
        assert_eq!((merged.helpful, merged.harmful), (3, 2));
    }

    #[test]
    fn test_merge_with_one_valid_source_removes_nothing() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(
            seeded(),
            &[
                merge(&["pat-001", "ghost"], "X", None),
                merge(&["pat-001"], "X", None),
                merge(&["pat-001", "pat-001"], "X", None),
                merge(&["pat-001", "pat-002"], "  ", None),
            ],
        );
        assert_eq!(outcome.report.applied(), 0);
        assert_eq!(outcome.playbook, seeded());
    }

    #[test]
    fn test_update_changes_text_only() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(
            seeded(),
            &[Operation::Update {
                target_id: " pat-001 ".to_string(),
                text: "rewritten".to_string(),
            }],
        );
        let entry = outcome.playbook.get("pat-001").unwrap();
        assert_eq!(entry.text, "rewritten");
        assert_eq!((entry.helpful, entry.harmful), (5, 1));
        assert_eq!(outcome.playbook.find("pat-001").unwrap(), (Section::Patterns, 0));
    }

    #[test]
    fn test_delete_and_missing_targets() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(
            seeded(),
            &[
                Operation::Delete {
                    target_id: "mis-001".to_string(),
                    reason: Some("obsolete".to_string()),
                },
                Operation::Delete {
                    target_id: "mis-001".to_string(),
                    reason: None,
                },
                Operation::Update {
                    target_id: "nope".to_string(),
                    text: "x".to_string(),
                },
                Operation::Unknown {
                    kind: "RENAME".to_string(),
                },
            ],
        );
        assert_eq!(outcome.report.applied(), 1);
        assert_eq!(outcome.report.skipped(), 3);
        assert!(!outcome.playbook.contains_name("mis-001"));
    }

    #[test]
    fn test_later_operations_see_earlier_ones() {
        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(
            Playbook::new(),
            &[
                add("alpha", Some("OTHERS")),
                add("beta", Some("OTHERS")),
                merge(&["oth-001", "oth-002"], "alpha and beta", None),
                Operation::Delete {
                    target_id: "oth-003".to_string(),
                    reason: None,
                },
            ],
        );
        assert_eq!(outcome.report.applied(), 4);
        assert!(outcome.playbook.is_empty());
    }

    #[test]
    fn test_truncates_to_configured_limit() {
        let engine = CuratorEngine::new(CuratorConfig::new().with_max_operations(2));
        let ops = vec![add("a", None), add("b", None), add("c", None)];
        let outcome = engine.apply_operations(Playbook::new(), &ops);
        assert_eq!(outcome.report.received, 3);
        assert_eq!(outcome.report.processed, 2);
        assert_eq!(outcome.report.truncated(), 1);
        assert_eq!(outcome.playbook.len(), 2);
        assert!(!outcome.playbook.contains_text("c"));
    }

    #[test]
    fn test_defect_rolls_back_whole_batch() {
        let mut broken = seeded();
        // Duplicate names can only come from a caller bypassing the store.
        broken.push(Section::Others, PlaybookEntry::new("pat-001", "clash"));

        let engine = CuratorEngine::default();
        let outcome = engine.apply_operations(broken.clone(), &[add("fresh", None)]);
        assert!(!outcome.committed());
        assert!(matches!(outcome.rollback, Some(Error::OperationFailed { .. })));
        assert_eq!(outcome.playbook, broken);
    }

    #[test]
    fn test_new_key_points_are_not_truncated() {
        let engine = CuratorEngine::new(CuratorConfig::new().with_max_operations(1));
        let points: Vec<_> = (0..3)
            .map(|i| NewKeyPoint {
                text: format!("point {i}"),
                section: None,
            })
            .collect();
        let outcome = engine.apply_new_key_points(Playbook::new(), &points);
        assert_eq!(outcome.playbook.len(), 3);
        assert_eq!(outcome.report.truncated(), 0);
    }
}
