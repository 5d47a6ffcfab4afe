//! Benchmarks for near-duplicate clustering.
//!
//! Clustering compares every pair of entries, so cost grows quadratically
//! with playbook size. Benchmark targets:
//! - 50 entries: <1ms
//! - 200 entries: <10ms
//!
//! Vectors come from a deterministic synthetic embedder so the numbers
//! measure clustering alone, not model inference.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::cast_precision_loss
)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use agentic_context::embedding::Embedder;
use agentic_context::models::{Playbook, PlaybookEntry, Section};
use agentic_context::services::deduplication::{
    DeduplicationConfig, DeduplicationService, find_clusters,
};

const DIMENSIONS: usize = 64;

// ============================================================================
// Synthetic Embedder
// ============================================================================

/// Maps each text to a unit vector derived from its bytes.
///
/// Texts sharing a `topic-N` prefix land close together, so every fifth
/// entry forms a cluster with its neighbours.
struct SyntheticEmbedder;

impl Embedder for SyntheticEmbedder {
    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn embed(&self, text: &str) -> agentic_context::Result<Vec<f32>> {
        let topic: usize = text
            .split(':')
            .next()
            .and_then(|t| t.strip_prefix("topic-"))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let mut vector = vec![0.0_f32; DIMENSIONS];
        vector[topic % DIMENSIONS] = 1.0;
        for (i, byte) in text.bytes().enumerate() {
            vector[(i * 7 + usize::from(byte)) % DIMENSIONS] += 0.01;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        Ok(vector.into_iter().map(|x| x / norm).collect())
    }
}

fn playbook_of(size: usize) -> Playbook {
    let mut playbook = Playbook::new();
    for i in 0..size {
        let section = Section::ALL[i % Section::COUNT];
        let name = playbook.allocate_id(section);
        playbook.push(
            section,
            PlaybookEntry::new(name, format!("topic-{}: insight number {i}", i / 5))
                .with_counters(1, 0),
        );
    }
    playbook
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_find_clusters(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_find_clusters");

    for size in [10, 50, 200] {
        let playbook = playbook_of(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &playbook, |b, pb| {
            b.iter(|| find_clusters(&SyntheticEmbedder, black_box(pb), 0.85).unwrap());
        });
    }

    group.finish();
}

fn bench_deduplicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup_full_pass");
    let service = DeduplicationService::new(DeduplicationConfig::default())
        .with_embedder(Box::new(SyntheticEmbedder));

    for size in [50, 200] {
        let playbook = playbook_of(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &playbook, |b, pb| {
            b.iter(|| service.deduplicate(black_box(pb.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find_clusters, bench_deduplicate);
criterion_main!(benches);
