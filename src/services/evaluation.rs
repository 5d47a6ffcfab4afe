//! Evaluation counters.

use crate::models::{Evaluation, Playbook, Rating};

/// Counts of how a set of evaluations was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    /// `helpful` increments.
    pub helpful: usize,
    /// `harmful` increments.
    pub harmful: usize,
    /// Neutral or unrecognised ratings.
    pub ignored: usize,
    /// Ratings naming no existing entry.
    pub unknown_names: usize,
}

impl EvaluationSummary {
    /// Number of counters changed.
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.helpful + self.harmful
    }
}

/// Applies evaluations to the playbook.
///
/// `helpful` and `harmful` ratings increment the matching counter by one.
/// Everything else, including ratings of unknown entries, is a no-op.
pub fn apply_evaluations(playbook: &mut Playbook, evaluations: &[Evaluation]) -> EvaluationSummary {
    let mut summary = EvaluationSummary::default();

    for evaluation in evaluations {
        let Some(entry) = playbook.get_mut(&evaluation.name) else {
            tracing::debug!(name = %evaluation.name, "Evaluation names no entry");
            summary.unknown_names += 1;
            continue;
        };
        match evaluation.rating {
            Rating::Helpful => {
                entry.helpful = entry.helpful.saturating_add(1);
                summary.helpful += 1;
            },
            Rating::Harmful => {
                entry.harmful = entry.harmful.saturating_add(1);
                summary.harmful += 1;
            },
            Rating::Neutral | Rating::Other(_) => summary.ignored += 1,
        }
    }

    if summary.applied() > 0 {
        metrics::counter!("playbook_evaluations_total", "rating" => "helpful")
            .increment(summary.helpful as u64);
        metrics::counter!("playbook_evaluations_total", "rating" => "harmful")
            .increment(summary.harmful as u64);
    }
    tracing::debug!(
        helpful = summary.helpful,
        harmful = summary.harmful,
        ignored = summary.ignored,
        unknown = summary.unknown_names,
        "Applied evaluations"
    );
    summary
}
