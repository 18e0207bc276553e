//! Simulation benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use skirmish_core::config::GameConfig;
use skirmish_core::simulation::Simulation;
use skirmish_test_utils::fixtures;

/// Ticks a fresh skirmish and a mid-size battle.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("skirmish_1000_ticks", |b| {
        b.iter_batched(
            || Simulation::new_skirmish(GameConfig::with_seed(17)),
            |mut sim| {
                for _ in 0..1000 {
                    sim.tick();
                }
                black_box(sim.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("battle_200_ticks", |b| {
        b.iter_batched(
            || fixtures::battle_world(5).0,
            |mut sim| {
                for _ in 0..200 {
                    sim.tick();
                }
                black_box(sim.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    let mut warm = Simulation::new_skirmish(GameConfig::with_seed(3));
    for _ in 0..400 {
        warm.tick();
    }
    c.bench_function("state_hash", |b| b.iter(|| black_box(warm.state_hash())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
