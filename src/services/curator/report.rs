//! Curation result types.

use crate::models::Section;
use std::fmt::{self, Write as _};

/// Characters of a deleted entry's text quoted in the delete audit.
pub const AUDIT_TEXT_LIMIT: usize = 80;

/// Why an operation was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The text was empty after trimming.
    BlankText,
    /// An entry with exactly this text already exists.
    DuplicateText,
    /// A merge named fewer than two sources.
    TooFewSources {
        /// Number of source ids supplied.
        given: usize,
    },
    /// Fewer than two merge sources exist in the playbook.
    TooFewValidSources {
        /// Sources that resolved to an entry.
        valid: usize,
        /// Sources that did not.
        missing: Vec<String>,
    },
    /// The target id was empty after trimming.
    BlankTarget,
    /// No entry carries the target id.
    TargetNotFound(String),
    /// The operation type is missing or unsupported.
    UnknownType(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankText => f.write_str("text is blank"),
            Self::DuplicateText => f.write_str("identical text already exists"),
            Self::TooFewSources { given } => {
                write!(f, "merge needs at least 2 source ids, got {given}")
            },
            Self::TooFewValidSources { valid, missing } => write!(
                f,
                "only {valid} merge source(s) exist; missing: {}",
                missing.join(", ")
            ),
            Self::BlankTarget => f.write_str("target id is blank"),
            Self::TargetNotFound(id) => write!(f, "no entry named '{id}'"),
            Self::UnknownType(kind) if kind.is_empty() => f.write_str("operation has no type"),
            Self::UnknownType(kind) => write!(f, "unknown operation type '{kind}'"),
        }
    }
}

/// What happened to one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// A new entry was appended.
    Added {
        /// Allocated name.
        name: String,
        /// Target section.
        section: Section,
    },
    /// Sources were replaced by one combined entry.
    Merged {
        /// Allocated name of the combined entry.
        name: String,
        /// Section holding the combined entry.
        section: Section,
        /// Sources removed.
        sources: Vec<String>,
        /// Sources named but not found.
        missing: Vec<String>,
    },
    /// An entry's text was replaced.
    Updated {
        /// Name of the changed entry.
        name: String,
    },
    /// An entry was removed.
    Deleted {
        /// Name of the removed entry.
        name: String,
        /// Section it was removed from.
        section: Section,
        /// Text of the removed entry.
        text: String,
        /// Audit note supplied with the operation.
        reason: Option<String>,
    },
    /// The operation changed nothing.
    Skipped {
        /// Operation label (`ADD`, `MERGE`, ...).
        operation: &'static str,
        /// Why it was skipped.
        reason: SkipReason,
    },
}

impl OperationOutcome {
    /// Returns true if the operation changed the playbook.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }

    /// Label of the operation that produced this outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Added { .. } => "ADD",
            Self::Merged { .. } => "MERGE",
            Self::Updated { .. } => "UPDATE",
            Self::Deleted { .. } => "DELETE",
            Self::Skipped { operation, .. } => *operation,
        }
    }

    /// IDs this operation named that no entry carried.
    ///
    /// Only MERGE sources and DELETE targets are reported.
    #[must_use]
    pub fn missing_ids(&self) -> Vec<&str> {
        match self {
            Self::Merged { missing, .. }
            | Self::Skipped {
                reason: SkipReason::TooFewValidSources { missing, .. },
                ..
            } => missing.iter().map(String::as_str).collect(),
            Self::Skipped {
                operation,
                reason: SkipReason::TargetNotFound(id),
            } if *operation == "DELETE" => vec![id.as_str()],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { name, section } => write!(f, "ADD {name} -> {section}"),
            Self::Merged {
                name,
                section,
                sources,
                missing,
            } => {
                write!(f, "MERGE {} -> {name} in {section}", sources.join(" + "))?;
                if !missing.is_empty() {
                    write!(f, " (missing: {})", missing.join(", "))?;
                }
                Ok(())
            },
            Self::Updated { name } => write!(f, "UPDATE {name}"),
            Self::Deleted {
                name,
                section,
                reason,
                ..
            } => {
                write!(f, "DELETE {name} from {section}")?;
                if let Some(reason) = reason {
                    write!(f, " ({reason})")?;
                }
                Ok(())
            },
            Self::Skipped { operation, reason } => write!(f, "SKIP {operation}: {reason}"),
        }
    }
}

/// Summary of one curator batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurationReport {
    /// Operations received.
    pub received: usize,
    /// Operations considered after truncation.
    pub processed: usize,
    /// Per-operation results, in order.
    pub outcomes: Vec<OperationOutcome>,
}

impl CurationReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new(received: usize, processed: usize) -> Self {
        Self {
            received,
            processed,
            outcomes: Vec::new(),
        }
    }

    /// Operations dropped by truncation.
    #[must_use]
    pub const fn truncated(&self) -> usize {
        self.received.saturating_sub(self.processed)
    }

    /// Number of operations that changed the playbook.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    /// Number of operations skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    /// Applied and skipped counts per operation label, in first-seen order.
    #[must_use]
    pub fn counts_by_operation(&self) -> Vec<(&'static str, usize, usize)> {
        let mut counts: Vec<(&'static str, usize, usize)> = Vec::new();
        for outcome in &self.outcomes {
            let label = outcome.label();
            let index = match counts.iter().position(|(l, _, _)| *l == label) {
                Some(index) => index,
                None => {
                    counts.push((label, 0, 0));
                    counts.len() - 1
                },
            };
            if outcome.is_applied() {
                counts[index].1 += 1;
            } else {
                counts[index].2 += 1;
            }
        }
        counts
    }

    /// Describes the dropped tail of a truncated batch.
    #[must_use]
    pub fn truncation_report(&self) -> Option<String> {
        (self.truncated() > 0).then(|| {
            format!(
                "received: {}\nprocessed: {}\ndropped: {}\n",
                self.received,
                self.processed,
                self.truncated()
            )
        })
    }

    /// Lists operations that named IDs absent from the playbook.
    #[must_use]
    pub fn missing_id_report(&self) -> Option<String> {
        let mut text = String::new();
        for (i, outcome) in self.outcomes.iter().enumerate() {
            for id in outcome.missing_ids() {
                let _ = writeln!(text, "[{}] {} references nonexistent id '{id}'", i + 1, outcome.label());
            }
        }
        (!text.is_empty()).then_some(text)
    }

    /// Records every applied DELETE with the removed text and its reason.
    #[must_use]
    pub fn delete_audit_report(&self) -> Option<String> {
        let mut text = String::new();
        for outcome in &self.outcomes {
            if let OperationOutcome::Deleted {
                name,
                section,
                text: removed,
                reason,
            } = outcome
            {
                let _ = writeln!(text, "DELETE {name} from {section}");
                let _ = writeln!(text, "  text: {}", clip(removed, AUDIT_TEXT_LIMIT));
                let _ = writeln!(text, "  reason: {}", reason.as_deref().unwrap_or("(none given)"));
            }
        }
        (!text.is_empty()).then_some(text)
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut.
fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

impl fmt::Display for CurationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "received: {}, processed: {}, applied: {}, skipped: {}",
            self.received,
            self.processed,
            self.applied(),
            self.skipped()
        )?;
        if self.truncated() > 0 {
            writeln!(f, "truncated: {} operation(s) dropped", self.truncated())?;
        }
        for (label, applied, skipped) in self.counts_by_operation() {
            writeln!(f, "{label}: applied={applied} skipped={skipped}")?;
        }
        for (i, outcome) in self.outcomes.iter().enumerate() {
            writeln!(f, "  [{}] {outcome}", i + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(name: &str, text: &str, reason: Option<&str>) -> OperationOutcome {
        OperationOutcome::Deleted {
            name: name.to_string(),
            section: Section::Others,
            text: text.to_string(),
            reason: reason.map(str::to_string),
        }
    }

    fn report(outcomes: Vec<OperationOutcome>) -> CurationReport {
        CurationReport {
            received: outcomes.len(),
            processed: outcomes.len(),
            outcomes,
        }
    }

    #[test]
    fn test_counts_by_operation() {
        let report = report(vec![
            OperationOutcome::Added {
                name: "oth-002".to_string(),
                section: Section::Others,
            },
            OperationOutcome::Skipped {
                operation: "DELETE",
                reason: SkipReason::TargetNotFound("nope".to_string()),
            },
            deleted("oth-001", "A", Some("remove")),
        ]);
        assert_eq!(
            report.counts_by_operation(),
            vec![("ADD", 1, 0), ("DELETE", 1, 1)]
        );
        let text = report.to_string();
        assert!(text.contains("ADD: applied=1 skipped=0"));
        assert!(text.contains("DELETE: applied=1 skipped=1"));
    }

    #[test]
    fn test_missing_ids_from_merge_and_delete_only() {
        let report = report(vec![
            OperationOutcome::Merged {
                name: "oth-003".to_string(),
                section: Section::Others,
                sources: vec!["oth-001".to_string(), "oth-002".to_string()],
                missing: vec!["oth-999".to_string()],
            },
            OperationOutcome::Skipped {
                operation: "DELETE",
                reason: SkipReason::TargetNotFound("pat-999".to_string()),
            },
            OperationOutcome::Skipped {
                operation: "UPDATE",
                reason: SkipReason::TargetNotFound("pat-998".to_string()),
            },
        ]);
        let text = report.missing_id_report().unwrap();
        assert!(text.contains("[1] MERGE references nonexistent id 'oth-999'"));
        assert!(text.contains("[2] DELETE references nonexistent id 'pat-999'"));
        assert!(!text.contains("pat-998"));
    }

    #[test]
    fn test_no_reports_for_clean_batch() {
        let report = report(vec![OperationOutcome::Updated {
            name: "pat-001".to_string(),
        }]);
        assert!(report.truncation_report().is_none());
        assert!(report.missing_id_report().is_none());
        assert!(report.delete_audit_report().is_none());
    }

    #[test]
    fn test_delete_audit_clips_long_text() {
        let long = "é".repeat(200);
        let report = report(vec![deleted("oth-001", &long, None)]);
        let audit = report.delete_audit_report().unwrap();
        assert!(audit.contains(&format!("  text: {}...", "é".repeat(AUDIT_TEXT_LIMIT))));
        assert!(!audit.contains(&"é".repeat(AUDIT_TEXT_LIMIT + 1)));
        assert!(audit.contains("reason: (none given)"));
    }

    #[test]
    fn test_truncation_report() {
        let mut report = CurationReport::new(15, 10);
        assert_eq!(
            report.truncation_report().unwrap(),
            "received: 15\nprocessed: 10\ndropped: 5\n"
        );
        report.received = 10;
        assert!(report.truncation_report().is_none());
    }
}
