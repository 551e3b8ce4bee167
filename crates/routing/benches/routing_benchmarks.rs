//! Benchmarks for cable routing.
//!
//! Measures junction resolution, route evaluation and the full search at
//! various mosaic sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lumatile_core::{TileShape, TileSpec, Tiling};
use lumatile_routing::{RoutingConfig, RoutingOptimizer, RoutingProblem, RoutingState};

fn hexagons(n: usize) -> Tiling {
    let spec = TileSpec::new(TileShape::Hexagon, 0, 0.1, 0.005).unwrap();
    Tiling::full(spec, n, n).unwrap()
}

fn bench_junctions(c: &mut Criterion) {
    let mut group = c.benchmark_group("junctions");
    for &n in &[4, 8, 16] {
        let tiling = hexagons(n);
        group.bench_with_input(BenchmarkId::new("hexagons", n * n), &tiling, |b, t| {
            b.iter(|| black_box(t.junctions()))
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let tiling = hexagons(10);
    let problem = RoutingProblem::new(&tiling, &RoutingConfig::default()).unwrap();
    let state = RoutingState::new((0..100).collect(), vec![0; 100]);
    c.bench_function("evaluate_100_hexagons", |b| {
        b.iter(|| black_box(problem.evaluate(black_box(&state))))
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing_search");
    group.sample_size(10);

    for &n in &[3, 5, 8] {
        let tiling = hexagons(n);
        let optimizer = RoutingOptimizer::new(
            RoutingConfig::new()
                .with_max_iterations(10)
                .with_seed(42),
        );
        group.bench_with_input(BenchmarkId::new("hexagons", n * n), &tiling, |b, t| {
            b.iter(|| black_box(optimizer.run(t, None)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_junctions, bench_evaluate, bench_search);
criterion_main!(benches);
