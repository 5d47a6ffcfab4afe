//! Playbook persistence.
//!
//! [`PlaybookStore`] reads and writes the single JSON record kept per
//! project. [`migration`] reconciles whatever shape is on disk into the
//! current model.

pub mod migration;
mod playbook_store;

pub use migration::{MigrationReport, RecordFormat, migrate_record};
pub use playbook_store::PlaybookStore;
