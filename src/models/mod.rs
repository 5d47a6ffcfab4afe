//! Data models.
//!
//! The persisted playbook, its entries and sections, and the loosely typed
//! inputs (operations, evaluations) produced by upstream collaborators.

mod entry;
mod extraction;
pub mod ids;
mod operation;
mod playbook;
mod section;

pub use entry::PlaybookEntry;
pub use extraction::{Evaluation, ExtractionResult, NewKeyPoint, Rating};
pub use ids::{extract_cited_ids, generate_id};
pub use operation::Operation;
pub use playbook::{PLAYBOOK_VERSION, Playbook, Sections};
pub use section::{Section, SectionResolution, resolve_section, resolve_section_logged};
