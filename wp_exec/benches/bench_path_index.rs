//! Nearest waypoint lookup benchmarks, comparing the path's k-d tree with a linear scan.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{Vector2, Vector3};

use wp_lib::path::{PathIndex, Waypoint};

/// A closed loop track of `num_points` waypoints, like a test circuit.
fn loop_track(num_points: usize) -> PathIndex {
    let radius_m = num_points as f64 / (2.0 * std::f64::consts::PI);

    PathIndex::build(
        (0..num_points)
            .map(|i| {
                let theta = i as f64 / num_points as f64 * 2.0 * std::f64::consts::PI;
                Waypoint::new(
                    Vector3::new(radius_m * theta.cos(), radius_m * (2.0 * theta).sin(), 0.0),
                    10.0,
                )
            })
            .collect(),
    )
    .expect("Track is not empty")
}

fn linear_nearest(path: &PathIndex, position_m: &Vector2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist_sq = f64::INFINITY;

    for (i, wp) in path.waypoints().iter().enumerate() {
        let dist_sq = (wp.position2() - position_m).norm_squared();
        if dist_sq < best_dist_sq {
            best = i;
            best_dist_sq = dist_sq;
        }
    }

    best
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_waypoint");

    for num_points in [1_000, 10_000, 100_000].iter() {
        let path = loop_track(*num_points);
        let target = Vector2::new(3.3, -7.1);

        group.bench_with_input(BenchmarkId::new("kdtree", num_points), &path, |b, p| {
            b.iter(|| p.nearest(black_box(&target)))
        });

        group.bench_with_input(BenchmarkId::new("linear", num_points), &path, |b, p| {
            b.iter(|| linear_nearest(p, black_box(&target)))
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("build_10000", |b| b.iter(|| loop_track(black_box(10_000))));
}

criterion_group!(benches, bench_nearest, bench_build);
criterion_main!(benches);
