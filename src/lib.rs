//! # Agentic Context
//!
//! A curated playbook of short insights distilled from an AI agent's work
//! sessions.
//!
//! Insights ("key points") live in five fixed sections, each carrying
//! helpful/harmful counters. Every session end feeds a batch of curator
//! operations and evaluations through the engine, which then prunes entries
//! with disproportionate harmful feedback and collapses near-duplicates by
//! embedding similarity.
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Load and migrate the persisted record | [`storage`] |
//! | Apply ADD / MERGE / UPDATE / DELETE batches | [`services::curator`] |
//! | Apply helpful / harmful evaluations | [`services::evaluation`] |
//! | Evict harmful entries | [`services::pruning`] |
//! | Collapse near-duplicates | [`services::deduplication`] |
//! | Save the whole record | [`storage`] |
//!
//! ## Example
//!
//! ```rust
//! use agentic_context::models::{ExtractionResult, Section};
//! use agentic_context::services::{CuratorEngine, update_playbook_data};
//! use agentic_context::Playbook;
//! use serde_json::json;
//!
//! let extraction = ExtractionResult::from_value(&json!({
//!     "operations": [
//!         {"type": "ADD", "text": "Run the linter before committing", "section": "patterns & approaches"}
//!     ],
//!     "evaluations": []
//! }));
//!
//! let (playbook, _report) =
//!     update_playbook_data(&CuratorEngine::default(), Playbook::new(), &extraction);
//! assert_eq!(playbook.entries(Section::Patterns)[0].name, "pat-001");
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
// Current duplicates: fastembed→ort transitive deps.
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod embedding;
pub mod hooks;
pub mod models;
pub mod observability;
pub mod rendering;
pub mod services;
pub mod storage;

pub use config::AgenticContextConfig;
pub use embedding::Embedder;
pub use models::{
    Evaluation, ExtractionResult, Operation, Playbook, PlaybookEntry, Rating, Section,
};
pub use services::{
    CurationOutcome, CuratorEngine, DeduplicationService, PlaybookPipeline, update_playbook_data,
};
pub use storage::PlaybookStore;

/// Error type for playbook operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed extraction JSON, bad template, empty embedding input |
/// | `OperationFailed` | I/O errors, embedding provider failures, invariant breaks inside a batch |
/// | `ContractViolation` | A caller hands `save` a record without a `sections` object |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Filesystem I/O errors occur
    /// - The embedding provider fails or returns malformed vectors
    /// - A playbook invariant is found broken after a curator operation
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A caller broke a documented precondition.
    ///
    /// This signals a programming error in the caller, never bad external data.
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

/// Result type alias for playbook operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current UTC time as an RFC 3339 timestamp with second precision.
///
/// # Examples
///
/// ```rust
/// use agentic_context::current_timestamp_iso;
///
/// let ts = current_timestamp_iso();
/// assert!(ts.ends_with('Z'));
/// ```
#[must_use]
pub fn current_timestamp_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
