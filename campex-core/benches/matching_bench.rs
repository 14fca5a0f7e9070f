mod common;
use campex_core::prelude::*;
use common::*;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

/// Cost of admitting 10k non-crossing resting limit orders: book insertion
/// and price-band classification, no matching.
fn bench_resting_placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("placing 10k non-crossing limit orders");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("place_order 10k sells", |b| {
        b.iter_batched(
            bench_engine,
            |mut engine| {
                for i in 0..10_000u64 {
                    let price = 1_000 + (i % 500);
                    engine
                        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 10, Some(price))
                        .unwrap();
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

/// Cost of crossing 10k incoming buys against 10k resting sells: the actual
/// matching-loop work, not just book admission.
fn bench_crossing_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching 10k crossing orders");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("cross 10k buys against 10k resting sells", |b| {
        b.iter_batched(
            || {
                let mut engine = bench_engine();
                for i in 0..10_000u64 {
                    let price = 1_000 + (i % 500);
                    engine
                        .place_order(ParticipantId(2), Side::Sell, OrderType::Limit, 10, Some(price))
                        .unwrap();
                }
                engine
            },
            |mut engine| {
                for _ in 0..10_000u64 {
                    let _ = engine.place_order(ParticipantId(1), Side::Buy, OrderType::Limit, 10, Some(1_500));
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_resting_placement, bench_crossing_throughput);
criterion_main!(benches);
