//! Shared helpers for the synthesis integration tests.

#![allow(dead_code)]

use nalgebra::Matrix4;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use qsynth_compile::Program;
use qsynth_compile::unitary::unitarity_deviation;
use qsynth_sim::{Statevector, circuit_unitary};

/// Random complex number with both parts uniform in [-1, 1).
pub fn random_complex(rng: &mut StdRng) -> Complex64 {
    Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
}

/// Random unitary by Gram-Schmidt over the columns of a random matrix.
pub fn random_unitary(num_qubits: u32, seed: u64) -> Array2<Complex64> {
    let dim = 1usize << num_qubits;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut u = Array2::from_shape_fn((dim, dim), |_| random_complex(&mut rng));
    for j in 0..dim {
        for k in 0..j {
            let overlap: Complex64 = (0..dim).map(|i| u[[i, k]].conj() * u[[i, j]]).sum();
            for i in 0..dim {
                let projected = u[[i, k]] * overlap;
                u[[i, j]] -= projected;
            }
        }
        let norm = (0..dim).map(|i| u[[i, j]].norm_sqr()).sum::<f64>().sqrt();
        for i in 0..dim {
            u[[i, j]] /= norm;
        }
    }
    u
}

/// Random diagonal unitary.
pub fn random_diagonal(num_qubits: u32, seed: u64) -> Array2<Complex64> {
    let dim = 1usize << num_qubits;
    let mut rng = StdRng::seed_from_u64(seed);
    let phases: Array1<Complex64> = (0..dim)
        .map(|_| Complex64::from_polar(1.0, rng.gen_range(-3.1..3.1)))
        .collect();
    Array2::from_diag(&phases)
}

/// Random Hermitian observable.
pub fn random_observable(dim: usize, rng: &mut StdRng) -> Array2<Complex64> {
    let a = Array2::from_shape_fn((dim, dim), |_| random_complex(rng));
    let adjoint = a.t().mapv(|z| z.conj());
    a + adjoint
}

/// Haar-random real special orthogonal 4x4 matrix.
///
/// QR of a Gaussian matrix with the signs of `diag R` moved into `Q`, then
/// one column negated when the determinant is −1.
pub fn random_so4(seed: u64) -> nalgebra::Matrix4<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (mut q, r) = Matrix4::<f64>::from_fn(|_, _| rng.sample(StandardNormal))
        .qr()
        .unpack();
    for c in 0..4 {
        if r[(c, c)] < 0.0 {
            q.column_mut(c).neg_mut();
        }
    }
    if q.determinant() < 0.0 {
        q.column_mut(0).neg_mut();
    }
    q
}

/// `u` plus a seeded perturbation of its nonzero entries, scaled so that
/// `||UU† − I||_F` is close to `deviation`.
pub fn near_unitary(u: &Array2<Complex64>, deviation: f64, seed: u64) -> Array2<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let direction = u.mapv(|z| {
        if z == Complex64::new(0.0, 0.0) {
            z
        } else {
            random_complex(&mut rng)
        }
    });
    let step = 1e-9;
    let measured = unitarity_deviation(&(u + &direction.mapv(|z| z * step)));
    let scale = step * deviation / measured;
    u + &direction.mapv(|z| z * scale)
}

/// Dense operator of a compiled program.
pub fn program_operator(program: &Program) -> Array2<Complex64> {
    let circuit = program.to_circuit("test").expect("program converts to a circuit");
    circuit_unitary(&circuit).expect("operator reconstruction")
}

/// Largest entry-wise difference, global phase included.
pub fn max_difference(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f64::max)
}

/// Compare `⟨Uψ|M|Uψ⟩` with `⟨Cψ|M|Cψ⟩` over random states and observables.
///
/// Returns the largest absolute deviation seen.
pub fn expectation_deviation(
    unitary: &Array2<Complex64>,
    program: &Program,
    trials: usize,
    seed: u64,
) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let circuit = program.to_circuit("test").expect("program converts to a circuit");
    let n = program.num_qubits as usize;
    let mut worst = 0.0_f64;

    for _ in 0..trials {
        let psi = Statevector::random(n, &mut rng);
        let observable = random_observable(1 << n, &mut rng);

        let exact = unitary.dot(&Array1::from(psi.amplitudes().to_vec()));
        let exact = Statevector::from_amplitudes(exact.to_vec()).expect("power-of-two length");

        let mut compiled = psi.clone();
        compiled.apply_circuit(&circuit).expect("circuit applies");

        let expected = exact.expectation(&observable).expect("observable fits");
        let got = compiled.expectation(&observable).expect("observable fits");
        worst = worst.max((expected - got).norm());
    }
    worst
}
