//! Semantic deduplication of playbook entries.
//!
//! Entries are embedded through an [`Embedder`](crate::embedding::Embedder),
//! compared pairwise by cosine similarity and grouped with a union-find, so
//! near-duplicate chains collapse transitively.
//!
//! ```text
//! flatten (canonical order) -> embed -> pairwise cosine >= threshold
//!     -> union-find components -> keep earliest member, sum counters
//! ```
//!
//! # Example
//!
//! ```rust
//! use agentic_context::models::Playbook;
//! use agentic_context::services::deduplication::{
//!     DedupStatus, DeduplicationConfig, DeduplicationService,
//! };
//!
//! // Without a provider the pass is a logged no-op.
//! let service = DeduplicationService::new(DeduplicationConfig::default());
//! let (playbook, report) = service.deduplicate(Playbook::new());
//! assert!(playbook.is_empty());
//! assert_eq!(report.status, DedupStatus::TooFewEntries);
//! ```

mod config;
mod service;
mod union_find;

pub use config::{
    DEDUP_ENABLED_ENV, DEDUP_THRESHOLD_ENV, DEFAULT_DEDUP_THRESHOLD, DeduplicationConfig,
    resolve_threshold,
};
pub use service::{DedupReport, DedupStatus, DeduplicationService, DuplicateCluster, find_clusters};
pub use union_find::UnionFind;
