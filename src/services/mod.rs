//! Playbook services.
//!
//! Each stage operates on an owned [`Playbook`](crate::models::Playbook) and
//! hands back the next state; [`PlaybookPipeline`] chains them between a load
//! and a save.

pub mod curator;
pub mod deduplication;
pub mod evaluation;
mod pipeline;
pub mod pruning;

pub use curator::{CurationOutcome, CuratorEngine};
pub use deduplication::DeduplicationService;
pub use pipeline::{PipelineReport, PlaybookPipeline, UpdatePath, UpdateReport, update_playbook_data};
