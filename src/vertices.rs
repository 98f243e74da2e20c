//! Vertex and propagator functions.
//!
//! Each Lorentz structure of the model comes with an `amplitude` function,
//! closing three wavefunctions into a complex number, and `off_shell_*`
//! functions that contract two wavefunctions and attach a propagator
//! `coup / (p² - M (M - i W))` for the remaining leg. The off-shell momentum
//! is minus the sum of the flow momenta of the inputs.
//!
//! Fermion arguments follow one convention throughout: `f1` is a spinor
//! column (built by `fermion_in` or an `off_shell_f2` call), `f2` a barred
//! row (built by `fermion_out` or an `off_shell_f1` call).

pub mod ffv;
pub mod vvv;

pub use ffv::{ffv1, ffv2, ffv2_4, ffv4};
pub use vvv::vvv1;

use crate::{
    lanes::{ComplexLane, Lane},
    wavefunctions::Wavefunction,
};

/// Sums the flow components of two wavefunctions into a fresh one and
/// returns it together with the off-shell momentum.
#[inline(always)]
pub(crate) fn combine_flows<L: Lane>(
    a: &Wavefunction<L>,
    b: &Wavefunction<L>,
) -> (Wavefunction<L>, [L; 4]) {
    let mut out = Wavefunction::zero();
    out[0] = a[0] + b[0];
    out[1] = a[1] + b[1];
    let p = out.flow_momentum().map(|x| -x);
    (out, p)
}

#[inline(always)]
pub(crate) fn minkowski_square<L: Lane>(p: &[L; 4]) -> L {
    p[0] * p[0] - p[1] * p[1] - p[2] * p[2] - p[3] * p[3]
}

#[inline(always)]
pub(crate) fn minkowski_dot<L: Lane>(a: &[ComplexLane<L>; 4], b: &[ComplexLane<L>; 4]) -> ComplexLane<L> {
    a[0] * b[0] - a[1] * b[1] - a[2] * b[2] - a[3] * b[3]
}

/// `coup / (p² - M (M - i W))`.
#[inline(always)]
pub(crate) fn propagator<L: Lane>(
    p: &[L; 4],
    coup: ComplexLane<L>,
    mass: f64,
    width: f64,
) -> ComplexLane<L> {
    let denominator = ComplexLane::new(
        minkowski_square(p) - L::splat(mass * mass),
        L::splat(mass * width),
    );
    coup / denominator
}

#[inline(always)]
pub(crate) fn to_complex<L: Lane>(p: &[L; 4]) -> [ComplexLane<L>; 4] {
    p.map(ComplexLane::from_real)
}

/// `v̸ · c` for a spinor column `c`.
#[inline(always)]
pub(crate) fn slash_column<L: Lane>(
    v: &[ComplexLane<L>; 4],
    c: &[ComplexLane<L>; 4],
) -> [ComplexLane<L>; 4] {
    let plus = v[0] + v[3];
    let minus = v[0] - v[3];
    let transverse = v[1] + v[2].mul_i();
    let transverse_bar = v[1] - v[2].mul_i();
    [
        minus * c[2] - transverse_bar * c[3],
        -(transverse * c[2]) + plus * c[3],
        plus * c[0] + transverse_bar * c[1],
        transverse * c[0] + minus * c[1],
    ]
}

/// `r · v̸` for a barred spinor row `r`.
#[inline(always)]
pub(crate) fn row_slash<L: Lane>(
    r: &[ComplexLane<L>; 4],
    v: &[ComplexLane<L>; 4],
) -> [ComplexLane<L>; 4] {
    let plus = v[0] + v[3];
    let minus = v[0] - v[3];
    let transverse = v[1] + v[2].mul_i();
    let transverse_bar = v[1] - v[2].mul_i();
    [
        r[2] * plus + r[3] * transverse,
        r[2] * transverse_bar + r[3] * minus,
        r[0] * minus - r[1] * transverse,
        -(r[0] * transverse_bar) + r[1] * plus,
    ]
}

#[cfg(test)]
mod tests {
    use num::Complex;

    use super::*;

    fn cx(re: f64, im: f64) -> ComplexLane<f64> {
        ComplexLane::splat(Complex::new(re, im))
    }

    #[test]
    fn slash_squares_to_the_minkowski_norm() {
        // p̸ p̸ = p² on any spinor
        let p = [cx(7.0, 0.0), cx(1.0, 0.0), cx(-2.0, 0.0), cx(3.0, 0.0)];
        let c = [cx(0.5, 1.0), cx(-1.0, 0.25), cx(2.0, 0.0), cx(0.0, -3.0)];
        let p2 = minkowski_dot(&p, &p);
        let column = slash_column(&p, &slash_column(&p, &c));
        let row = row_slash(&row_slash(&c, &p), &p);
        for k in 0..4 {
            assert!((column[k] - c[k] * p2).lane(0).norm() < 1e-12);
            assert!((row[k] - c[k] * p2).lane(0).norm() < 1e-12);
        }
    }

    #[test]
    fn row_and_column_contractions_agree() {
        let v = [cx(1.0, 0.5), cx(-0.5, 2.0), cx(0.25, -1.0), cx(3.0, 0.0)];
        let r = [cx(1.0, 1.0), cx(0.0, -2.0), cx(-1.5, 0.0), cx(0.5, 0.5)];
        let c = [cx(-1.0, 0.0), cx(2.0, 1.0), cx(0.0, 0.75), cx(1.0, -1.0)];
        let via_row: ComplexLane<f64> = row_slash(&r, &v)
            .iter()
            .zip(c.iter())
            .fold(ComplexLane::zero(), |acc, (a, b)| acc + *a * *b);
        let via_column: ComplexLane<f64> = slash_column(&v, &c)
            .iter()
            .zip(r.iter())
            .fold(ComplexLane::zero(), |acc, (a, b)| acc + *a * *b);
        assert!((via_row - via_column).lane(0).norm() < 1e-12);
    }

    #[test]
    fn propagator_has_breit_wigner_form() {
        let p = [91.0, 0.0, 0.0, 0.0];
        let value = propagator(&p, cx(1.0, 0.0), 91.0, 2.5).lane(0);
        assert!((value - Complex::new(0.0, -1.0 / (91.0 * 2.5))).norm() < 1e-15);
    }
}
