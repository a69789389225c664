use std::hint::black_box;

use candy_haunt_core::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const SIZES: [Coord; 3] = [9, 13, 17];

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_layout");
    for size in SIZES {
        let config = GameConfig {
            board_size: size,
            ..GameConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &config, |b, config| {
            let mut seed = 0;
            b.iter(|| {
                seed += 1;
                black_box(RandomLayoutGenerator::new(seed).generate(config))
            });
        });
    }
    group.finish();
}

fn bench_ghost_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghost_phase");
    for size in SIZES {
        let config = GameConfig {
            board_size: size,
            ..GameConfig::default()
        };
        let Ok(engine) = PlayEngine::setup(config, Some(7), &[1, 2, 3, 4]) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(size), &engine, |b, engine| {
            b.iter_batched(
                || {
                    let mut engine = engine.clone();
                    let _ = engine.start();
                    engine
                },
                |mut engine| black_box(engine.finish_round()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generation, bench_ghost_phase);
criterion_main!(benches);
