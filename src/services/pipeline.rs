//! Per-invocation playbook update pipeline.

use super::curator::{CurationReport, CuratorEngine};
use super::deduplication::{DedupReport, DedupStatus, DeduplicationService};
use super::evaluation::{EvaluationSummary, apply_evaluations};
use super::pruning::prune;
use crate::config::AgenticContextConfig;
use crate::models::{ExtractionResult, Playbook, PlaybookEntry, Section};
use crate::observability::DiagnosticWriter;
use crate::storage::{MigrationReport, PlaybookStore};
use crate::{Error, Result};
use std::fmt::{self, Write as _};
use tracing::instrument;

/// Which extraction path fed the curator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePath {
    /// `operations` was present (possibly empty).
    Operations,
    /// `operations` was absent; `new_key_points` were added.
    LegacyKeyPoints,
}

/// What [`update_playbook_data`] did.
#[derive(Debug)]
pub struct UpdateReport {
    /// Extraction path taken.
    pub path: UpdatePath,
    /// Per-operation outcomes of the curator batch.
    pub curation: CurationReport,
    /// Error that discarded the curator batch, if any.
    pub rollback: Option<Error>,
    /// Evaluation counts.
    pub evaluations: EvaluationSummary,
    /// Entries removed by pruning.
    pub pruned: Vec<(Section, PlaybookEntry)>,
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = match self.path {
            UpdatePath::Operations => "operations",
            UpdatePath::LegacyKeyPoints => "new_key_points",
        };
        writeln!(f, "path: {path}")?;
        write!(f, "{}", self.curation)?;
        if let Some(e) = &self.rollback {
            writeln!(f, "batch rolled back: {e}")?;
        }
        writeln!(
            f,
            "evaluations: helpful={} harmful={} ignored={} unknown={}",
            self.evaluations.helpful,
            self.evaluations.harmful,
            self.evaluations.ignored,
            self.evaluations.unknown_names
        )?;
        for (section, entry) in &self.pruned {
            writeln!(
                f,
                "pruned [{}] {} (helpful={} harmful={}) :: {}",
                section.name(),
                entry.name,
                entry.helpful,
                entry.harmful,
                entry.text
            )?;
        }
        Ok(())
    }
}

/// Applies one extraction result to a playbook.
///
/// Runs the curator operations when `operations` is present (even if empty),
/// otherwise the legacy `new_key_points`; then the evaluations; then pruning.
/// A rolled-back curator batch does not stop evaluations or pruning.
#[instrument(skip_all, fields(entries = playbook.len()))]
pub fn update_playbook_data(
    engine: &CuratorEngine,
    playbook: Playbook,
    extraction: &ExtractionResult,
) -> (Playbook, UpdateReport) {
    let (path, outcome) = match &extraction.operations {
        Some(operations) => (
            UpdatePath::Operations,
            engine.apply_operations(playbook, operations),
        ),
        None => (
            UpdatePath::LegacyKeyPoints,
            engine.apply_new_key_points(playbook, &extraction.new_key_points),
        ),
    };

    let mut playbook = outcome.playbook;
    let evaluations = apply_evaluations(&mut playbook, &extraction.evaluations);
    let pruned = prune(&mut playbook);

    let report = UpdateReport {
        path,
        curation: outcome.report,
        rollback: outcome.rollback,
        evaluations,
        pruned,
    };
    (playbook, report)
}

/// What a full pipeline run did.
#[derive(Debug)]
pub struct PipelineReport {
    /// How the stored record was loaded.
    pub migration: MigrationReport,
    /// Curator, evaluation and pruning results.
    pub update: UpdateReport,
    /// Deduplication results.
    pub dedup: DedupReport,
    /// Entries in the saved playbook.
    pub entries: usize,
}

/// Load, update, deduplicate and save the playbook of one project.
pub struct PlaybookPipeline {
    store: PlaybookStore,
    curator: CuratorEngine,
    dedup: DeduplicationService,
    diagnostics: Option<DiagnosticWriter>,
}

impl PlaybookPipeline {
    /// Creates a pipeline from explicit parts.
    #[must_use]
    pub const fn new(store: PlaybookStore, curator: CuratorEngine, dedup: DeduplicationService) -> Self {
        Self {
            store,
            curator,
            dedup,
            diagnostics: None,
        }
    }

    /// Builds a pipeline for the configured project, using the embedding
    /// provider compiled into this build.
    #[must_use]
    pub fn from_config(config: &AgenticContextConfig) -> Self {
        let pipeline = Self::new(
            PlaybookStore::new(config.playbook_path()),
            CuratorEngine::new(config.curator),
            DeduplicationService::new(config.dedup).with_default_embedder(),
        );
        match config.diagnostics() {
            Some(writer) => pipeline.with_diagnostics(writer),
            None => pipeline,
        }
    }

    /// Enables diagnostic reports.
    #[must_use]
    pub fn with_diagnostics(mut self, writer: DiagnosticWriter) -> Self {
        self.diagnostics = Some(writer);
        self
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &PlaybookStore {
        &self.store
    }

    /// Applies an extraction result and saves the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the playbook cannot be saved.
    #[instrument(skip_all, fields(path = %self.store.path().display()))]
    pub fn run(&self, extraction: &ExtractionResult) -> Result<PipelineReport> {
        let (playbook, migration) = self.load();

        let (playbook, update) = update_playbook_data(&self.curator, playbook, extraction);
        self.diagnose_curation(&update);
        if !update.pruned.is_empty() {
            self.diagnose("prune", &update.to_string());
        }

        let (mut playbook, dedup) = self.deduplicate(playbook);
        self.store.save(&mut playbook)?;

        Ok(PipelineReport {
            migration,
            update,
            dedup,
            entries: playbook.len(),
        })
    }

    /// Prunes the stored playbook and saves it.
    ///
    /// # Errors
    ///
    /// Returns an error if the playbook cannot be saved.
    pub fn prune(&self) -> Result<Vec<(Section, PlaybookEntry)>> {
        let (mut playbook, _) = self.load();
        let pruned = prune(&mut playbook);
        if !pruned.is_empty() {
            let mut text = String::new();
            for (section, entry) in &pruned {
                let _ = writeln!(text, "[{}] {} :: {}", section.name(), entry.name, entry.text);
            }
            self.diagnose("prune", &text);
        }
        self.store.save(&mut playbook)?;
        Ok(pruned)
    }

    /// Deduplicates the stored playbook and saves it.
    ///
    /// # Errors
    ///
    /// Returns an error if the playbook cannot be saved.
    pub fn dedup(&self) -> Result<DedupReport> {
        let (playbook, _) = self.load();
        let (mut playbook, report) = self.deduplicate(playbook);
        self.store.save(&mut playbook)?;
        Ok(report)
    }

    /// Loads the stored playbook in any supported format and saves it in the
    /// current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the playbook cannot be saved.
    pub fn migrate(&self) -> Result<MigrationReport> {
        let (mut playbook, report) = self.load();
        self.store.save(&mut playbook)?;
        Ok(report)
    }

    fn load(&self) -> (Playbook, MigrationReport) {
        let (playbook, report) = self.store.load_with_report();
        if report.changed_record() {
            self.diagnose("migration", &report.to_string());
        }
        (playbook, report)
    }

    fn deduplicate(&self, playbook: Playbook) -> (Playbook, DedupReport) {
        let (playbook, report) = self.dedup.deduplicate(playbook);
        if matches!(report.status, DedupStatus::Merged | DedupStatus::Failed(_)) {
            self.diagnose("dedup", &report.to_string());
        }
        (playbook, report)
    }

    fn diagnose_curation(&self, update: &UpdateReport) {
        if self.diagnostics.is_none() || update.curation.received == 0 {
            return;
        }
        let curation = &update.curation;
        self.diagnose("curator_ops_summary", &update.to_string());
        if let Some(text) = curation.truncation_report() {
            self.diagnose("curator_ops_truncated", &text);
        }
        if let Some(text) = curation.missing_id_report() {
            self.diagnose("curator_nonexistent_id", &text);
        }
        // A rolled-back batch deleted nothing.
        if let Some(text) = curation.delete_audit_report().filter(|_| update.rollback.is_none()) {
            self.diagnose("curator_delete_audit", &text);
        }
    }

    fn diagnose(&self, name: &str, content: &str) {
        if let Some(writer) = &self.diagnostics {
            writer.write(name, content);
        }
    }
}
