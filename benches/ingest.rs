//! Ingestion and Filter-Churn Benchmarks
//!
//! Measures record ingestion throughput and the cost of incremental filter
//! reclassification vs the full-replay policy.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossdim::{Dimension, DimensionConfig, DimensionFilter, GroupKey};
use std::hint::black_box;

// =============================================================================
// Test Data Generators
// =============================================================================

#[derive(Clone, Copy)]
struct Event {
    series: u32,
    bucket: u32,
    value: f64,
}

/// Deterministic pseudo-random event stream over a fixed key cardinality.
fn create_events(count: usize, series_cardinality: u32, buckets: u32) -> Vec<Event> {
    let mut state = 0x2545f491u64;
    (0..count)
        .map(|_| {
            // xorshift, good enough for shaping benchmark data
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            Event {
                series: (state % series_cardinality as u64) as u32,
                bucket: ((state >> 8) % buckets as u64) as u32,
                value: (state % 1000) as f64 / 10.0,
            }
        })
        .collect()
}

fn sum_dimension(id: &str, reprocess_all: bool) -> Dimension<Event, f64> {
    let config = DimensionConfig::new(id)
        .group_series(|e: &Event| GroupKey::from(e.series))
        .group_data(|e: &Event| GroupKey::from(e.bucket))
        .reduce_init(|_e: &Event| 0.0)
        .reduce_add(|sum, e| *sum += e.value)
        .reduce_remove(|sum, e| *sum -= e.value)
        .reprocess_all_on_filter(reprocess_all);
    Dimension::new(config).expect("valid configuration")
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_add_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_many");
    for &count in &[1_000usize, 10_000, 100_000] {
        let events = create_events(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &events, |b, events| {
            b.iter(|| {
                let mut dim = sum_dimension("bench", false);
                dim.add_many(events.iter().copied());
                black_box(dim.data().len())
            });
        });
    }
    group.finish();
}

fn bench_filter_churn(c: &mut Criterion) {
    let events = create_events(50_000, 16, 64);
    let mut group = c.benchmark_group("filter_churn");

    for (label, reprocess_all) in [("incremental", false), ("reprocess_all", true)] {
        group.bench_function(label, |b| {
            let mut dim = sum_dimension("bench", reprocess_all);
            dim.add_many(events.iter().copied());
            b.iter(|| {
                dim.add_filter(DimensionFilter::new("f", |e: &Event| e.value > 50.0));
                dim.remove_filter(&DimensionFilter::<Event>::empty("f"));
                black_box(dim.stats().included)
            });
        });
    }
    group.finish();
}

fn bench_selection_export(c: &mut Criterion) {
    let events = create_events(10_000, 16, 64);
    c.bench_function("selection_export", |b| {
        let mut dim = sum_dimension("bench", false);
        dim.add_many(events.iter().copied());
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let picked: Vec<u32> = if flip { vec![1, 2, 3] } else { vec![4, 5] };
            dim.select(picked);
            black_box(dim.filter().is_active())
        });
    });
}

criterion_group!(
    benches,
    bench_add_many,
    bench_filter_churn,
    bench_selection_export
);
criterion_main!(benches);
