//! Fermion-fermion-vector structures.
//!
//! All of them are linear combinations of the left- and right-handed
//! currents `ψ̄ γ^μ P_L ψ` and `ψ̄ γ^μ P_R ψ`, so the shared work lives in
//! [`chiral_amplitude`] and [`chiral_off_shell_vector`].

use crate::{
    lanes::{ComplexLane, Lane},
    wavefunctions::Wavefunction,
};

use super::{combine_flows, propagator, row_slash, slash_column, to_complex};

/// Left and right-handed pieces of `f2 · v̸ · f1`.
#[inline(always)]
fn chiral_contraction<L: Lane>(
    f1: &Wavefunction<L>,
    f2: &Wavefunction<L>,
    v: &[ComplexLane<L>; 4],
) -> (ComplexLane<L>, ComplexLane<L>) {
    let row = row_slash(&f2.spin(), v);
    (
        f1[2] * row[0] + f1[3] * row[1],
        f1[4] * row[2] + f1[5] * row[3],
    )
}

/// Left and right-handed vector currents `f2 γ^μ P f1`.
#[inline(always)]
fn chiral_currents<L: Lane>(
    f1: &Wavefunction<L>,
    f2: &Wavefunction<L>,
) -> ([ComplexLane<L>; 4], [ComplexLane<L>; 4]) {
    let left = [
        f1[2] * f2[4] + f1[3] * f2[5],
        -(f1[2] * f2[5]) - f1[3] * f2[4],
        (f1[3] * f2[4] - f1[2] * f2[5]).mul_i(),
        f1[3] * f2[5] - f1[2] * f2[4],
    ];
    let right = [
        f1[4] * f2[2] + f1[5] * f2[3],
        f1[4] * f2[3] + f1[5] * f2[2],
        (f1[4] * f2[3] - f1[5] * f2[2]).mul_i(),
        f1[4] * f2[2] - f1[5] * f2[3],
    ];
    (left, right)
}

/// `-i (c_left L + c_right R)` for the contraction of `f2 v̸ f1`.
#[inline(always)]
fn chiral_amplitude<L: Lane>(
    f1: &Wavefunction<L>,
    f2: &Wavefunction<L>,
    v3: &Wavefunction<L>,
    c_left: ComplexLane<L>,
    c_right: ComplexLane<L>,
) -> ComplexLane<L> {
    let (left, right) = chiral_contraction(f1, f2, &v3.spin());
    -(c_left * left + c_right * right).mul_i()
}

/// Off-shell vector from a fermion pair. With `longitudinal` set and a
/// massive propagator, the `p^μ (p·J) / M²` piece is subtracted.
#[inline(always)]
fn chiral_off_shell_vector<L: Lane>(
    f1: &Wavefunction<L>,
    f2: &Wavefunction<L>,
    c_left: ComplexLane<L>,
    c_right: ComplexLane<L>,
    m3: f64,
    w3: f64,
    longitudinal: bool,
) -> Wavefunction<L> {
    let (mut v3, p3) = combine_flows(f1, f2);
    let denom = propagator(&p3, ComplexLane::from_real(L::one()), m3, w3);
    let (left, right) = chiral_currents(f1, f2);

    let om3 = if longitudinal && m3 != 0. {
        1. / (m3 * m3)
    } else {
        0.
    };
    let (p_left, p_right) = if om3 != 0. {
        chiral_contraction(f1, f2, &to_complex(&p3))
    } else {
        (ComplexLane::zero(), ComplexLane::zero())
    };
    let om3 = L::splat(om3);

    for mu in 0..4 {
        let j_left = left[mu] - p_left * (p3[mu] * om3);
        let j_right = right[mu] - p_right * (p3[mu] * om3);
        v3[2 + mu] = -(denom * (c_left * j_left + c_right * j_right)).mul_i();
    }
    v3
}

pub mod ffv1 {
    //! `γ^μ`, the vector coupling of photons and gluons.

    use super::*;

    pub fn amplitude<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup: ComplexLane<L>,
    ) -> ComplexLane<L> {
        chiral_amplitude(f1, f2, v3, coup, coup)
    }

    /// Off-shell barred spinor on leg 1, from the row `f2` and the vector `v3`.
    pub fn off_shell_f1<L: Lane>(
        f2: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup: ComplexLane<L>,
        m1: f64,
        w1: f64,
    ) -> Wavefunction<L> {
        let (mut f1, p1) = combine_flows(f2, v3);
        let denom = propagator(&p1, coup, m1, w1);
        let row = row_slash(&f2.spin(), &v3.spin());
        let row_p = row_slash(&row, &to_complex(&p1));
        let mass = L::splat(m1);
        for k in 0..4 {
            f1[2 + k] = (denom * (row[k] * mass - row_p[k])).mul_i();
        }
        f1
    }

    /// Off-shell spinor column on leg 2, from the column `f1` and the vector `v3`.
    pub fn off_shell_f2<L: Lane>(
        f1: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup: ComplexLane<L>,
        m2: f64,
        w2: f64,
    ) -> Wavefunction<L> {
        let (mut f2, p2) = combine_flows(f1, v3);
        let denom = propagator(&p2, coup, m2, w2);
        let column = slash_column(&v3.spin(), &f1.spin());
        let p_column = slash_column(&to_complex(&p2), &column);
        let mass = L::splat(m2);
        for k in 0..4 {
            f2[2 + k] = (denom * (column[k] * mass + p_column[k])).mul_i();
        }
        f2
    }

    /// Off-shell vector on leg 3, without the `p^μ p^ν` propagator term.
    pub fn off_shell_v3<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        coup: ComplexLane<L>,
        m3: f64,
        w3: f64,
    ) -> Wavefunction<L> {
        chiral_off_shell_vector(f1, f2, coup, coup, m3, w3, false)
    }
}

pub mod ffv2 {
    //! `γ^μ P_L`.

    use super::*;

    pub fn amplitude<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup: ComplexLane<L>,
    ) -> ComplexLane<L> {
        chiral_amplitude(f1, f2, v3, coup, ComplexLane::zero())
    }

    pub fn off_shell_v3<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        coup: ComplexLane<L>,
        m3: f64,
        w3: f64,
    ) -> Wavefunction<L> {
        chiral_off_shell_vector(f1, f2, coup, ComplexLane::zero(), m3, w3, true)
    }
}

pub mod ffv4 {
    //! `γ^μ P_L + 2 γ^μ P_R`.

    use super::*;

    pub fn amplitude<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup: ComplexLane<L>,
    ) -> ComplexLane<L> {
        chiral_amplitude(f1, f2, v3, coup, coup + coup)
    }

    pub fn off_shell_v3<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        coup: ComplexLane<L>,
        m3: f64,
        w3: f64,
    ) -> Wavefunction<L> {
        chiral_off_shell_vector(f1, f2, coup, coup + coup, m3, w3, true)
    }
}

pub mod ffv2_4 {
    //! `coup1 · FFV2 + coup2 · FFV4`, the Z coupling to fermions.

    use super::*;

    pub fn amplitude<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup1: ComplexLane<L>,
        coup2: ComplexLane<L>,
    ) -> ComplexLane<L> {
        chiral_amplitude(f1, f2, v3, coup1 + coup2, coup2 + coup2)
    }

    pub fn off_shell_v3<L: Lane>(
        f1: &Wavefunction<L>,
        f2: &Wavefunction<L>,
        coup1: ComplexLane<L>,
        coup2: ComplexLane<L>,
        m3: f64,
        w3: f64,
    ) -> Wavefunction<L> {
        chiral_off_shell_vector(f1, f2, coup1 + coup2, coup2 + coup2, m3, w3, true)
    }
}

#[cfg(test)]
mod tests {
    use num::Complex;

    use super::*;
    use crate::{
        momentum::{FourMomentum, Helicity, Sign},
        wavefunctions::{fermion_in, fermion_out, vector_boson},
    };

    fn cx(re: f64, im: f64) -> ComplexLane<f64> {
        ComplexLane::splat(Complex::new(re, im))
    }

    fn external_legs() -> (Wavefunction<f64>, Wavefunction<f64>, Wavefunction<f64>) {
        let m = 5.0;
        let p1 = FourMomentum::from_args((9.0f64 + 16.0 + 1.0 + m * m).sqrt(), 3.0, 4.0, -1.0);
        let p2 = FourMomentum::from_args((4.0f64 + 1.0 + 36.0 + m * m).sqrt(), -2.0, 1.0, 6.0);
        let k = FourMomentum::from_args((1.0f64 + 4.0 + 9.0).sqrt(), 1.0, -2.0, 3.0);
        (
            fermion_in(&p1, m, Helicity::Plus, Sign::Positive),
            fermion_out(&p2, m, Helicity::Minus, Sign::Positive),
            vector_boson(&k, 0.0, Helicity::Plus, Sign::Positive),
        )
    }

    fn close(a: ComplexLane<f64>, b: ComplexLane<f64>) -> bool {
        (a - b).lane(0).norm() <= 1e-12 * (1.0 + b.lane(0).norm())
    }

    #[test]
    fn combined_structures_are_linear() {
        let (f1, f2, v3) = external_legs();
        let (c1, c2) = (cx(0.3, -0.2), cx(-0.1, 0.7));

        let combined = ffv2_4::amplitude(&f1, &f2, &v3, c1, c2);
        let separate = ffv2::amplitude(&f1, &f2, &v3, c1) + ffv4::amplitude(&f1, &f2, &v3, c2);
        assert!(close(combined, separate));

        // γ^μ = γ^μ P_L + γ^μ P_R and FFV4 - FFV2 = 2 γ^μ P_R
        let c = cx(1.5, 0.5);
        let vector = ffv1::amplitude(&f1, &f2, &v3, c);
        let left = ffv2::amplitude(&f1, &f2, &v3, c);
        let right = (ffv4::amplitude(&f1, &f2, &v3, c) - left) * 0.5;
        assert!(close(vector, left + right));

        let mz = 91.188;
        let wz = 2.441404;
        let v_combined = ffv2_4::off_shell_v3(&f1, &f2, c1, c2, mz, wz);
        let v_separate_2 = ffv2::off_shell_v3(&f1, &f2, c1, mz, wz);
        let v_separate_4 = ffv4::off_shell_v3(&f1, &f2, c2, mz, wz);
        for mu in 0..6 {
            let expected = if mu < 2 {
                v_separate_2[mu]
            } else {
                v_separate_2[mu] + v_separate_4[mu]
            };
            assert!(close(v_combined[mu], expected), "component {}", mu);
        }
    }

    #[test]
    fn off_shell_vector_closes_to_amplitude() {
        // Contracting the off-shell current with a polarisation reproduces
        // the amplitude times the (massless) propagator.
        let (f1, f2, v) = external_legs();
        let coup = cx(0.0, -0.3);
        let current = ffv1::off_shell_v3(&f1, &f2, coup, 0.0, 0.0);
        let p = current.flow_momentum().map(|x| -x);
        let p2 = p[0] * p[0] - p[1] * p[1] - p[2] * p[2] - p[3] * p[3];

        let eps = v.spin();
        let j = current.spin();
        let contracted = j[0] * eps[0] - j[1] * eps[1] - j[2] * eps[2] - j[3] * eps[3];
        let amplitude = ffv1::amplitude(&f1, &f2, &v, coup);
        assert!(close(contracted * p2, amplitude));
    }

    #[test]
    fn off_shell_fermions_close_to_the_same_amplitude() {
        // f2 · v̸ · S(q) · v̸' · f1 built by propagating either fermion leg.
        let m = 5.0;
        let p2 = FourMomentum::from_args((4.0f64 + 1.0 + 36.0 + m * m).sqrt(), -2.0, 1.0, 6.0);
        let k = FourMomentum::from_args((1.0f64 + 4.0 + 9.0).sqrt(), 1.0, -2.0, 3.0);
        let k_prime = FourMomentum::from_args((16.0f64 + 1.0 + 4.0).sqrt(), -4.0, 1.0, 2.0);
        let p1 = p2 + k + k_prime;

        let f1 = fermion_in(&p1, m, Helicity::Minus, Sign::Positive);
        let f2 = fermion_out(&p2, m, Helicity::Plus, Sign::Positive);
        let v = vector_boson(&k, 0.0, Helicity::Plus, Sign::Positive);
        let v_prime = vector_boson(&k_prime, 0.0, Helicity::Minus, Sign::Positive);

        let coup = cx(0.0, 1.2);
        let (mass, width) = (173.0, 1.5);

        let via_f1 = ffv1::off_shell_f1(&f2, &v, coup, mass, width);
        let via_f2 = ffv1::off_shell_f2(&f1, &v_prime, coup, mass, width);

        let from_row = ffv1::amplitude(&f1, &via_f1, &v_prime, coup);
        let from_column = ffv1::amplitude(&via_f2, &f2, &v, coup);
        assert!(from_row.lane(0).norm() > 0.0);
        assert!(close(from_row, from_column));
    }
}
