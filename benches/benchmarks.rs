use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use multidim_projection::diagnostics::pairwise_distances;
use multidim_projection::{cmdscale, lamp_with_config, LampConfig};
use ndarray::Array2;
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

/// Generates uniform random points of shape (n_samples x n_features), seeded for reproducibility.
fn generate_random_points(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let distribution = Uniform::new(0.0, 1.0);
    Array2::from_shape_fn((n_samples, n_features), |_| rng.sample(distribution))
}

/// Roughly sqrt(n) evenly spaced control points, the usual LAMP choice.
fn control_indices(n_samples: usize) -> Vec<usize> {
    let step = ((n_samples as f64).sqrt() as usize).max(1);
    (0..n_samples).step_by(step).collect()
}

fn benchmark_cmdscale(c: &mut Criterion) {
    let mut group = c.benchmark_group("cmdscale");
    group.sample_size(10);
    for &n_samples in &[100usize, 400, 1000] {
        let points = generate_random_points(n_samples, 10, 42);
        let dist = pairwise_distances(&points.view());
        group.throughput(Throughput::Elements((n_samples * n_samples) as u64));
        group.bench_with_input(BenchmarkId::new("k2", n_samples), &dist, |b, dist| {
            b.iter(|| cmdscale(black_box(dist), 2).unwrap());
        });
    }
    group.finish();
}

fn benchmark_lamp(c: &mut Criterion) {
    let scenarios: [(&str, usize, usize); 3] = [
        ("small", 1_000, 10),
        ("medium", 10_000, 50),
        ("wide", 5_000, 300),
    ];

    for (name, n_samples, n_features) in scenarios {
        let x = generate_random_points(n_samples, n_features, 7);
        let controls = control_indices(n_samples);
        let control_points = x.select(ndarray::Axis(0), &controls);
        let ys = cmdscale(&pairwise_distances(&control_points.view()), 2).unwrap();

        let mut group = c.benchmark_group(format!("lamp/{}", name));
        group.sample_size(10);
        group.throughput(Throughput::Elements(n_samples as u64));
        for parallel in [false, true] {
            let config = LampConfig {
                parallel,
                ..LampConfig::default()
            };
            let id = BenchmarkId::new(
                if parallel { "parallel" } else { "sequential" },
                format!("{}_s{}_f{}_m{}", name, n_samples, n_features, controls.len()),
            );
            group.bench_with_input(id, &x, |b, x| {
                b.iter(|| lamp_with_config(black_box(x), &controls, &ys, &config).unwrap());
            });
        }
        group.finish();
    }
}

criterion_group!(benches, benchmark_cmdscale, benchmark_lamp);
criterion_main!(benches);
