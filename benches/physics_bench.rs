use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use verlet_grid::*;

const SPACING: f32 = 0.021;

fn prepare_particles(count: usize) -> ParticlesSoA {
    let columns = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);
    let origin = Vec2::new(-0.5 * columns as f32 * SPACING, -0.9);
    let mut particles = ParticlesSoA::block(columns, rows, origin, SPACING);
    particles.positions.truncate(count);
    particles.previous.truncate(count);
    particles
}

fn prepare_engine(count: usize, depth: u32) -> SimulationEngine {
    let config = SimulationConfig {
        subdivision_depth: depth,
        ..Default::default()
    };
    SimulationEngine::new(config, prepare_particles(count)).unwrap()
}

fn bench_engine_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");
    for &count in &[1_000usize, 2_500, 6_400] {
        group.bench_with_input(
            BenchmarkId::new("sequential", count),
            &count,
            |b, &count| {
                let mut engine = prepare_engine(count, 2);
                engine.set_parallel_enabled(false);
                b.iter(|| black_box(engine.tick()))
            },
        );
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, &count| {
            let mut engine = prepare_engine(count, 2);
            engine.set_parallel_enabled(true);
            b.iter(|| black_box(engine.tick()))
        });
    }
    group.finish();
}

fn bench_subdivision_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("subdivision_depth");
    for depth in 0..=4u32 {
        group.bench_with_input(BenchmarkId::new("tick", depth), &depth, |b, &depth| {
            let mut engine = prepare_engine(2_500, depth);
            b.iter(|| black_box(engine.tick()))
        });
    }
    group.finish();
}

fn bench_grid_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_rebuild");
    let config = SimulationConfig::default();
    let dimension = config.grid_dimension();
    for &count in &[1_000usize, 6_400] {
        let particles = prepare_particles(count);
        let mut grid = SpatialGrid::new(
            Vec2::splat(-1.0),
            config.cell_size(),
            dimension,
            dimension,
            CellCapacity::Dynamic,
        );
        group.bench_with_input(BenchmarkId::new("counting_sort", count), &count, |b, _| {
            b.iter(|| {
                grid.rebuild(black_box(&particles));
                black_box(grid.overflow_count())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_engine_tick,
    bench_subdivision_depth,
    bench_grid_rebuild
);
criterion_main!(benches);
