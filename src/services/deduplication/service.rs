//! Embedding-based deduplication pass.

use super::{DeduplicationConfig, UnionFind};
use crate::embedding::{Embedder, cosine_similarity, default_embedder};
use crate::models::Playbook;
use crate::{Error, Result};
use std::fmt;
use tracing::instrument;

/// A group of near-duplicate entries collapsed into one survivor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCluster {
    /// Name of the kept entry (earliest in canonical order).
    pub survivor: String,
    /// Names of the removed entries, in canonical order.
    pub absorbed: Vec<String>,
}

/// How a deduplication pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupStatus {
    /// At least one cluster was collapsed.
    Merged,
    /// Every entry was distinct.
    NoDuplicates,
    /// Fewer than two entries; nothing to compare.
    TooFewEntries,
    /// Deduplication is switched off.
    Disabled,
    /// No embedding provider is available.
    ProviderUnavailable,
    /// The pass failed and the playbook was left untouched.
    Failed(String),
}

/// Summary of one deduplication pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupReport {
    /// Outcome.
    pub status: DedupStatus,
    /// Threshold used.
    pub threshold: f32,
    /// Collapsed clusters.
    pub clusters: Vec<DuplicateCluster>,
}

impl DedupReport {
    const fn new(status: DedupStatus, threshold: f32) -> Self {
        Self {
            status,
            threshold,
            clusters: Vec::new(),
        }
    }

    /// Number of entries removed.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.clusters.iter().map(|c| c.absorbed.len()).sum()
    }
}

impl fmt::Display for DedupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status: {:?}, threshold: {:.3}", self.status, self.threshold)?;
        for cluster in &self.clusters {
            writeln!(
                f,
                "  {} absorbed {}",
                cluster.survivor,
                cluster.absorbed.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Collapses near-duplicate entries using embedding similarity.
///
/// Every entry is compared with every other; pairs at or above the threshold
/// are joined, and joins are transitive. Each resulting group keeps its
/// earliest entry (canonical section order, then insertion order), which takes
/// the summed counters of the group. Any failure leaves the playbook untouched.
pub struct DeduplicationService {
    embedder: Option<Box<dyn Embedder>>,
    config: DeduplicationConfig,
}

impl DeduplicationService {
    /// Creates a service with no embedding provider.
    #[must_use]
    pub const fn new(config: DeduplicationConfig) -> Self {
        Self {
            embedder: None,
            config,
        }
    }

    /// Sets the embedding provider.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Uses the provider compiled into this build, if any.
    #[must_use]
    pub fn with_default_embedder(mut self) -> Self {
        self.embedder = default_embedder();
        self
    }

    /// Returns the effective threshold.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// Runs the pass, returning the new playbook and what happened.
    ///
    /// On any failure the input playbook is returned unchanged.
    #[instrument(skip_all, fields(entries = playbook.len(), threshold = self.config.threshold))]
    pub fn deduplicate(&self, playbook: Playbook) -> (Playbook, DedupReport) {
        let threshold = self.config.threshold;
        if !self.config.enabled {
            return (playbook, DedupReport::new(DedupStatus::Disabled, threshold));
        }
        if playbook.len() < 2 {
            return (playbook, DedupReport::new(DedupStatus::TooFewEntries, threshold));
        }
        let Some(embedder) = self.embedder.as_deref() else {
            tracing::info!("No embedding provider available, skipping deduplication");
            return (
                playbook,
                DedupReport::new(DedupStatus::ProviderUnavailable, threshold),
            );
        };

        match find_clusters(embedder, &playbook, threshold)
            .and_then(|clusters| collapse(&playbook, &clusters).map(|p| (p, clusters)))
        {
            Ok((_, clusters)) if clusters.is_empty() => {
                (playbook, DedupReport::new(DedupStatus::NoDuplicates, threshold))
            },
            Ok((deduplicated, clusters)) => {
                let report = DedupReport {
                    status: DedupStatus::Merged,
                    threshold,
                    clusters,
                };
                tracing::info!(
                    clusters = report.clusters.len(),
                    removed = report.removed(),
                    "Collapsed duplicate entries"
                );
                metrics::counter!("playbook_dedup_removed_total")
                    .increment(report.removed() as u64);
                (deduplicated, report)
            },
            Err(e) => {
                tracing::warn!(error = %e, "Deduplication failed, playbook unchanged");
                (
                    playbook,
                    DedupReport::new(DedupStatus::Failed(e.to_string()), threshold),
                )
            },
        }
    }
}

/// Groups entries whose pairwise similarity reaches `threshold`.
///
/// # Errors
///
/// Returns an error if the provider fails or returns vectors that do not
/// line up with the entries.
pub fn find_clusters(
    embedder: &dyn Embedder,
    playbook: &Playbook,
    threshold: f32,
) -> Result<Vec<DuplicateCluster>> {
    let flat = playbook.flatten();
    let texts: Vec<&str> = flat.iter().map(|(_, e)| e.text.as_str()).collect();
    let vectors = embedder.embed_batch(&texts)?;
    check_vectors(&vectors, texts.len())?;

    let mut sets = UnionFind::new(vectors.len());
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            if cosine_similarity(&vectors[i], &vectors[j]) >= threshold {
                sets.union(i, j);
            }
        }
    }

    Ok(sets
        .groups()
        .into_iter()
        .filter(|group| group.len() > 1)
        .map(|group| DuplicateCluster {
            survivor: flat[group[0]].1.name.clone(),
            absorbed: group[1..]
                .iter()
                .map(|&idx| flat[idx].1.name.clone())
                .collect(),
        })
        .collect())
}

fn check_vectors(vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    if vectors.len() != expected {
        return Err(Error::OperationFailed {
            operation: "deduplicate".to_string(),
            cause: format!("expected {expected} embeddings, got {}", vectors.len()),
        });
    }
    let dims = vectors.first().map_or(0, Vec::len);
    if dims == 0 {
        return Err(Error::OperationFailed {
            operation: "deduplicate".to_string(),
            cause: "embedding provider returned empty vectors".to_string(),
        });
    }
    if let Some(bad) = vectors
        .iter()
        .position(|v| v.len() != dims || v.iter().any(|x| !x.is_finite()))
    {
        return Err(Error::OperationFailed {
            operation: "deduplicate".to_string(),
            cause: format!("embedding {bad} has the wrong dimensions or non-finite values"),
        });
    }
    Ok(())
}

/// Applies clusters to a copy of the playbook.
fn collapse(playbook: &Playbook, clusters: &[DuplicateCluster]) -> Result<Playbook> {
    let mut updated = playbook.clone();
    for cluster in clusters {
        let mut absorbed = Vec::with_capacity(cluster.absorbed.len());
        for name in &cluster.absorbed {
            let (_, entry) = updated.remove(name).ok_or_else(|| Error::OperationFailed {
                operation: "deduplicate".to_string(),
                cause: format!("cluster member '{name}' not found"),
            })?;
            absorbed.push(entry);
        }
        let survivor = updated
            .get_mut(&cluster.survivor)
            .ok_or_else(|| Error::OperationFailed {
                operation: "deduplicate".to_string(),
                cause: format!("cluster survivor '{}' not found", cluster.survivor),
            })?;
        for entry in &absorbed {
            survivor.absorb_counters(entry);
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlaybookEntry, Section};
    use std::collections::HashMap;

    /// Maps known texts to fixed vectors.
    struct TableEmbedder(HashMap<&'static str, Vec<f32>>);

    impl Embedder for TableEmbedder {
        fn dimensions(&self) -> usize {
            3
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.0
                .get(text)
                .cloned()
                .ok_or_else(|| Error::InvalidInput(format!("no vector for '{text}'")))
        }
    }

    fn service(table: &[(&'static str, [f32; 3])]) -> DeduplicationService {
        let map = table.iter().map(|(t, v)| (*t, v.to_vec())).collect();
        DeduplicationService::new(DeduplicationConfig::default())
            .with_embedder(Box::new(TableEmbedder(map)))
    }

    fn playbook(entries: &[(Section, &str, &str, u32, u32)]) -> Playbook {
        let mut playbook = Playbook::new();
        for (section, name, text, helpful, harmful) in entries {
            playbook.push(
                *section,
                PlaybookEntry::new(*name, *text).with_counters(*helpful, *harmful),
            );
        }
        playbook
    }

    #[test]
    fn test_cross_section_survivor_keeps_its_section() {
        let svc = service(&[("a", [1.0, 0.0, 0.0]), ("b", [1.0, 0.0, 0.0]), ("c", [0.0, 1.0, 0.0])]);
        let input = playbook(&[
            (Section::Others, "oth-001", "b", 1, 1),
            (Section::Patterns, "pat-001", "a", 2, 0),
            (Section::Others, "oth-002", "c", 0, 0),
        ]);

        let (output, report) = svc.deduplicate(input);
        assert_eq!(report.status, DedupStatus::Merged);
        assert_eq!(
            report.clusters,
            vec![DuplicateCluster {
                survivor: "pat-001".to_string(),
                absorbed: vec!["oth-001".to_string()]
            }]
        );
        let survivor = output.get("pat-001").unwrap();
        assert_eq!((survivor.helpful, survivor.harmful), (3, 1));
        assert_eq!(survivor.text, "a");
        assert_eq!(output.find("pat-001").unwrap().0, Section::Patterns);
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_provider_failure_leaves_playbook_untouched() {
        let svc = service(&[("a", [1.0, 0.0, 0.0])]);
        let input = playbook(&[
            (Section::Others, "oth-001", "a", 0, 0),
            (Section::Others, "oth-002", "unknown text", 0, 0),
        ]);
        let (output, report) = svc.deduplicate(input.clone());
        assert_eq!(output, input);
        assert!(matches!(report.status, DedupStatus::Failed(_)));
    }

    #[test]
    fn test_mismatched_dimensions_fail_closed() {
        struct Ragged;
        impl Embedder for Ragged {
            fn dimensions(&self) -> usize {
                2
            }
            fn embed(&self, text: &str) -> Result<Vec<f32>> {
                Ok(if text == "a" { vec![1.0, 0.0] } else { vec![1.0] })
            }
        }
        let svc = DeduplicationService::new(DeduplicationConfig::default())
            .with_embedder(Box::new(Ragged));
        let input = playbook(&[
            (Section::Others, "oth-001", "a", 0, 0),
            (Section::Others, "oth-002", "b", 0, 0),
        ]);
        let (output, report) = svc.deduplicate(input.clone());
        assert_eq!(output, input);
        assert!(matches!(report.status, DedupStatus::Failed(_)));
    }

    #[test]
    fn test_short_circuits() {
        let single = playbook(&[(Section::Others, "oth-001", "a", 0, 0)]);
        let (_, report) = service(&[]).deduplicate(single);
        assert_eq!(report.status, DedupStatus::TooFewEntries);

        let pair = playbook(&[
            (Section::Others, "oth-001", "a", 0, 0),
            (Section::Others, "oth-002", "b", 0, 0),
        ]);
        let (_, report) = DeduplicationService::new(DeduplicationConfig::default())
            .deduplicate(pair.clone());
        assert_eq!(report.status, DedupStatus::ProviderUnavailable);

        let (output, report) = DeduplicationService::new(DeduplicationConfig::default().with_enabled(false))
            .deduplicate(pair.clone());
        assert_eq!(report.status, DedupStatus::Disabled);
        assert_eq!(output, pair);
    }

    #[test]
    fn test_distinct_entries_are_kept() {
        let svc = service(&[("a", [1.0, 0.0, 0.0]), ("b", [0.0, 1.0, 0.0])]);
        let input = playbook(&[
            (Section::Others, "oth-001", "a", 0, 0),
            (Section::Others, "oth-002", "b", 0, 0),
        ]);
        let (output, report) = svc.deduplicate(input.clone());
        assert_eq!(report.status, DedupStatus::NoDuplicates);
        assert_eq!(output, input);
    }
}
