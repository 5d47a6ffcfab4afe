//! On-disk playbook persistence.
//!
//! One JSON file per project. Every save rewrites the whole file; there is no
//! incremental persistence and no locking (last writer wins).

use super::migration::{MigrationReport, RecordFormat, migrate_record};
use crate::models::Playbook;
use crate::{Error, Result, current_timestamp_iso};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Maximum playbook file size (16MB).
/// Larger files are treated as unreadable instead of being loaded into memory.
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Loads and saves the playbook record.
#[derive(Debug, Clone)]
pub struct PlaybookStore {
    path: PathBuf,
}

impl PlaybookStore {
    /// Creates a store backed by the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the playbook, migrating older shapes as needed.
    ///
    /// Never fails: a missing, oversized or unparseable file yields a fresh
    /// empty playbook.
    #[must_use]
    pub fn load(&self) -> Playbook {
        self.load_with_report().0
    }

    /// Loads the playbook and reports what reconciliation changed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load_with_report(&self) -> (Playbook, MigrationReport) {
        let contents = match self.read_contents() {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::debug!("No playbook on disk, starting empty");
                return (Playbook::new(), MigrationReport::default());
            },
            Err(e) => {
                tracing::warn!(error = %e, "Playbook unreadable, starting empty");
                return (Playbook::new(), unreadable_report());
            },
        };

        let record: Value = match serde_json::from_str(&contents) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Playbook is not valid JSON, starting empty");
                return (Playbook::new(), unreadable_report());
            },
        };

        let (playbook, report) = migrate_record(&record);
        tracing::debug!(
            format = report.format.as_str(),
            entries = report.entries_loaded,
            dropped = report.dropped_entries,
            "Loaded playbook"
        );
        if report.format == RecordFormat::Legacy {
            tracing::info!(
                entries = report.entries_loaded,
                "Migrated legacy key_points playbook"
            );
        }
        (playbook, report)
    }

    /// Saves the playbook, stamping `last_updated` with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the file cannot be written.
    pub fn save(&self, playbook: &mut Playbook) -> Result<()> {
        let record = serde_json::to_value(&*playbook).map_err(|e| Error::OperationFailed {
            operation: "serialize_playbook".to_string(),
            cause: e.to_string(),
        })?;
        let stamped = self.save_record(record)?;
        playbook.last_updated = Some(stamped);
        Ok(())
    }

    /// Saves a raw record, returning the `last_updated` stamp written.
    ///
    /// Any `key_points` key is stripped before writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContractViolation`] if the record is not an object with
    /// a `sections` object, and [`Error::OperationFailed`] on I/O failure.
    #[instrument(skip(self, record), fields(path = %self.path.display()))]
    pub fn save_record(&self, record: Value) -> Result<String> {
        let Value::Object(mut obj) = record else {
            return Err(Error::ContractViolation(
                "playbook record must be a JSON object".to_string(),
            ));
        };
        if !obj.get("sections").is_some_and(Value::is_object) {
            return Err(Error::ContractViolation(
                "playbook record has no 'sections' object".to_string(),
            ));
        }

        obj.remove("key_points");
        let stamped = current_timestamp_iso();
        obj.insert("last_updated".to_string(), Value::String(stamped.clone()));

        let json = serde_json::to_string_pretty(&obj).map_err(|e| Error::OperationFailed {
            operation: "serialize_playbook".to_string(),
            cause: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_playbook_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }

        fs::write(&self.path, json).map_err(|e| Error::OperationFailed {
            operation: "write_playbook".to_string(),
            cause: format!("{}: {e}", self.path.display()),
        })?;

        metrics::counter!("playbook_saves_total").increment(1);
        tracing::debug!(last_updated = %stamped, "Saved playbook");
        Ok(stamped)
    }

    /// Reads the file, returning `None` if it does not exist.
    fn read_contents(&self) -> Result<Option<String>> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::OperationFailed {
                    operation: "stat_playbook".to_string(),
                    cause: e.to_string(),
                });
            },
        };

        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::OperationFailed {
                operation: "read_playbook".to_string(),
                cause: format!(
                    "file is {} bytes, limit is {MAX_FILE_SIZE}",
                    metadata.len()
                ),
            });
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| Error::OperationFailed {
                operation: "read_playbook".to_string(),
                cause: e.to_string(),
            })
    }
}

const fn unreadable_report() -> MigrationReport {
    MigrationReport::with_format(RecordFormat::Unreadable)
}
