//! Criterion micro-benchmarks for force-to-sampling node interpolation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use gale_bench::{reference_counts, rotor_geometry};
use gale_interp::{interpolate_segment, interpolate_turbine, radial_parameters};

/// Benchmark: interpolate a full rotor and tower (3x50 -> 3x200 blade nodes).
fn bench_interpolate_turbine(c: &mut Criterion) {
    let counts = reference_counts();
    let (force_pos, sample_pos) = rotor_geometry(&counts);
    let force_vel: Vec<[f64; 3]> = force_pos.iter().map(|p| [p[2] / 9.0, 0.1, 0.0]).collect();
    let mut out = vec![[0.0; 3]; sample_pos.len()];
    let force_layout = counts.force_layout();
    let velocity_layout = counts.velocity_layout();

    c.bench_function("interpolate_turbine_3x200", |b| {
        b.iter(|| {
            interpolate_turbine(
                &force_layout,
                &velocity_layout,
                &force_pos,
                &sample_pos,
                &force_vel,
                &mut out,
            )
            .unwrap();
            black_box(&out);
        });
    });
}

/// Benchmark: one blade segment, 1000 sampling nodes against 100 force nodes.
fn bench_interpolate_segment_dense(c: &mut Criterion) {
    let force: Vec<[f64; 3]> = (0..100).map(|i| [0.0, i as f64 * 0.6, 90.0]).collect();
    let sample: Vec<[f64; 3]> = (0..1000).map(|i| [0.0, i as f64 * 0.06, 90.0]).collect();
    let fp = radial_parameters(&force);
    let sp = radial_parameters(&sample);
    let values: Vec<[f64; 3]> = fp.iter().map(|&r| [r.sqrt(), 0.0, 0.0]).collect();
    let mut out = vec![[0.0; 3]; sp.len()];

    c.bench_function("interpolate_segment_100_to_1000", |b| {
        b.iter(|| {
            interpolate_segment(gale_core::NodeType::Blade(0), &fp, &values, &sp, &mut out)
                .unwrap();
            black_box(&out);
        });
    });
}

criterion_group!(
    benches,
    bench_interpolate_turbine,
    bench_interpolate_segment_dense
);
criterion_main!(benches);
