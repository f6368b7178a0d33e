use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hifitime::{Epoch, Unit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use argoatlas::constants::VesselId;
use argoatlas::reports::Sample;
use argoatlas::trajectories::simplifier::Simplifier;
use argoatlas::trajectories::store::MemoryTrajectoryStore;

/// A noisy straight track with an occasional sharp turn.
fn noisy_track(rng: &mut StdRng, n: usize) -> Vec<Sample> {
    let t0 = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
    let mut course: f64 = 90.0;
    (0..n)
        .map(|i| {
            if rng.random_bool(0.02) {
                course = (course + rng.random_range(-90.0..90.0)).rem_euclid(360.0);
            }
            let noise = rng.random_range(-0.3..0.3);
            Sample::at(t0 + Unit::Second * (10 * i as i64), 4.0 + i as f64 * 1e-3, 52.0)
                .with_course(course + noise)
                .with_speed(12.0 + noise)
                .with_turn_rate(0.0)
        })
        .collect()
}

/// Single vessel, in-memory store: cost of one observe call.
fn bench_observe(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xA15);
    let simplifier = Simplifier::default();

    c.bench_function("simplifier/observe_10k_reports", |b| {
        b.iter_batched(
            || (MemoryTrajectoryStore::new(), noisy_track(&mut rng, 10_000)),
            |(store, samples)| {
                for sample in &samples {
                    let w = simplifier
                        .observe(&store, VesselId(1), black_box(sample))
                        .unwrap();
                    black_box(w);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// The detector alone, without the store round trip.
fn bench_step(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xC05);
    let simplifier = Simplifier::default();
    let samples = noisy_track(&mut rng, 10_000);

    c.bench_function("simplifier/step_10k_reports", |b| {
        b.iter(|| {
            let mut trajectory = simplifier.start(VesselId(1), &samples[0]);
            for sample in &samples[1..] {
                black_box(simplifier.step(&mut trajectory, black_box(sample)));
            }
        })
    });
}

criterion_group!(benches, bench_observe, bench_step);
criterion_main!(benches);
