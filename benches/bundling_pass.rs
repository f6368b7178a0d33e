use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use argoatlas::bundling::golden_section::golden_section_search;
use argoatlas::bundling::EdgeBundler;
use argoatlas::constants::Quad;
use argoatlas::graph::proximity::ProximityGraph;

/// `lanes` shipping lanes, each with `per_lane` jittered segments.
fn lanes(rng: &mut StdRng, lanes: usize, per_lane: usize) -> Vec<Quad> {
    let mut quads = Vec::with_capacity(lanes * per_lane);
    for lane in 0..lanes {
        let x = lane as f64 * 0.5;
        for _ in 0..per_lane {
            let mut jitter = || rng.random_range(-0.01..0.01);
            let (a, b, c, d) = (jitter(), jitter(), jitter(), jitter());
            quads.push([x + a, b, x + 0.4 + c, 1.0 + d]);
        }
    }
    quads
}

fn bench_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xB0D1E5);
    let quads = lanes(&mut rng, 20, 50);

    c.bench_function("proximity/build_1000_segments", |b| {
        b.iter(|| black_box(ProximityGraph::from_segments(black_box(&quads), 0.05, 8)))
    });
}

fn bench_bundle(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x1A4E);
    let quads = lanes(&mut rng, 10, 30);
    let bundler = EdgeBundler::default();

    c.bench_function("bundling/full_run_300_segments", |b| {
        b.iter_batched(
            || ProximityGraph::from_segments(&quads, 0.05, 8),
            |mut graph| black_box(bundler.bundle(&mut graph)),
            BatchSize::LargeInput,
        )
    });

    c.bench_function("bundling/single_pass_300_segments", |b| {
        b.iter_batched(
            || ProximityGraph::from_segments(&quads, 0.05, 8),
            |mut graph| black_box(bundler.pass(&mut graph)),
            BatchSize::LargeInput,
        )
    });
}

fn bench_golden_section(c: &mut Criterion) {
    c.bench_function("golden_section/quadratic", |b| {
        b.iter(|| {
            golden_section_search(
                |x| (x - black_box(0.37)).powi(2),
                0.0,
                1.0,
                1e-5,
                100,
            )
        })
    });
}

criterion_group!(benches, bench_build, bench_bundle, bench_golden_section);
criterion_main!(benches);
