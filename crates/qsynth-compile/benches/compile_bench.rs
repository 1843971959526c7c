//! Benchmarks for unitary synthesis
//!
//! Run with: cargo bench -p qsynth-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use qsynth_compile::{UnitaryCompiler, qr_unblocked};

fn random_unitary(num_qubits: u32, seed: u64) -> Array2<Complex64> {
    let dim = 1usize << num_qubits;
    let mut rng = StdRng::seed_from_u64(seed);
    let m = Array2::from_shape_fn((dim, dim), |_| {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    });
    qr_unblocked(&m).map(|factors| factors.q()).unwrap()
}

fn random_diagonal(num_qubits: u32, seed: u64) -> Array2<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let phases: Array1<Complex64> = (0..1usize << num_qubits)
        .map(|_| Complex64::from_polar(1.0, rng.gen_range(-3.0..3.0)))
        .collect();
    Array2::from_diag(&phases)
}

/// Benchmark the two-qubit path
fn bench_two_qubit(c: &mut Criterion) {
    let compiler = UnitaryCompiler::default();
    let u = random_unitary(2, 1);
    c.bench_function("two_qubit_kak", |b| {
        b.iter(|| compiler.compile(black_box(&u), 2).unwrap());
    });
}

/// Benchmark diagonal synthesis at increasing widths
fn bench_diagonal(c: &mut Criterion) {
    let mut group = c.benchmark_group("diagonal");
    let compiler = UnitaryCompiler::default();

    for n in [4u32, 6, 8, 10] {
        let d = random_diagonal(n, u64::from(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &d, |b, d| {
            b.iter(|| compiler.compile(black_box(d), n).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the general Householder path
fn bench_general(c: &mut Criterion) {
    let mut group = c.benchmark_group("general");
    group.sample_size(10);
    let compiler = UnitaryCompiler::default();

    for n in [3u32, 4, 5] {
        let u = random_unitary(n, 100 + u64::from(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &u, |b, u| {
            b.iter(|| compiler.compile(black_box(u), n).unwrap());
        });
    }

    group.finish();
}

/// Benchmark state preparation
fn bench_prepare_state(c: &mut Criterion) {
    let compiler = UnitaryCompiler::default();
    let u = random_unitary(6, 7);
    let state: Vec<Complex64> = u.column(0).to_vec();
    c.bench_function("prepare_state_6", |b| {
        b.iter(|| compiler.prepare_state(black_box(&state)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_two_qubit,
    bench_diagonal,
    bench_general,
    bench_prepare_state
);
criterion_main!(benches);
