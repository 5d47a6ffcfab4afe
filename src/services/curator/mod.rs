//! Curator operations engine.
//!
//! Applies batches of ADD / MERGE / UPDATE / DELETE instructions produced by
//! an LLM collaborator.
//!
//! # Batch Semantics
//!
//! | Step | Behavior |
//! |------|----------|
//! | Truncation | Only the first `max_operations` (default 10) are processed |
//! | Ordering | Operations apply sequentially; later ones see earlier effects |
//! | Validation | Invalid operations are skipped, the batch continues |
//! | Atomicity | The batch runs on a clone; an internal failure returns the original |
//!
//! # Example
//!
//! ```rust
//! use agentic_context::models::{Operation, Playbook, Section};
//! use agentic_context::services::curator::CuratorEngine;
//!
//! let engine = CuratorEngine::default();
//! let outcome = engine.apply_operations(
//!     Playbook::new(),
//!     &[Operation::Add { text: "Check CI logs first".to_string(), section: None }],
//! );
//! assert!(outcome.committed());
//! assert_eq!(outcome.playbook.entries(Section::Others)[0].name, "oth-001");
//! ```

mod config;
mod engine;
mod report;

pub use config::{CuratorConfig, DEFAULT_MAX_OPERATIONS};
pub use engine::{CurationOutcome, CuratorEngine};
pub use report::{AUDIT_TEXT_LIMIT, CurationReport, OperationOutcome, SkipReason};
