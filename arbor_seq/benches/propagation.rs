// Benchmarks for the per-tick hot path: reach-probability propagation and
// a full engine tick.

use std::hint::black_box;

use arbor_prng::TreeRng;
use arbor_seq::engine::{Engine, TickInputs};
use arbor_seq::graph::BRANCH_NODES;
use arbor_seq::prob::reach_probabilities;
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_propagation(c: &mut Criterion) {
    let mut rng = TreeRng::new(1, 1);
    let mut weights = [0.0f32; BRANCH_NODES];
    for w in weights.iter_mut() {
        *w = rng.uniform();
    }
    c.bench_function("reach_probabilities", |b| {
        b.iter(|| reach_probabilities(black_box(&weights)))
    });
}

fn bench_engine_tick(c: &mut Criterion) {
    let mut engine = Engine::new(7);
    let inputs = TickInputs {
        dt: 1.0 / 48_000.0,
        forward: true,
        ..TickInputs::default()
    };
    c.bench_function("engine_tick_forward", |b| {
        b.iter(|| {
            engine.tick(black_box(&inputs));
            engine.node()
        })
    });
}

criterion_group!(benches, bench_propagation, bench_engine_tick);
criterion_main!(benches);
