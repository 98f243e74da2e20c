//! Triple vector boson structures.

use crate::{
    lanes::{ComplexLane, Lane},
    wavefunctions::Wavefunction,
};

use super::{combine_flows, minkowski_dot, propagator, to_complex};

pub mod vvv1 {
    //! The non-abelian `g^{μν}(p1 - p2)^ρ + cyclic` vertex.

    use super::*;

    /// Off-shell vector on leg 1 from the vectors `v2` and `v3`, without the
    /// `p^μ p^ν` propagator term.
    pub fn off_shell_v1<L: Lane>(
        v2: &Wavefunction<L>,
        v3: &Wavefunction<L>,
        coup: ComplexLane<L>,
        m1: f64,
        w1: f64,
    ) -> Wavefunction<L> {
        let p2 = to_complex(&v2.flow_momentum());
        let p3 = to_complex(&v3.flow_momentum());
        let (mut v1, p1) = combine_flows(v2, v3);
        let denom = propagator(&p1, coup, m1, w1);
        let p1 = to_complex(&p1);

        let e2 = v2.spin();
        let e3 = v3.spin();
        let e3_p1 = minkowski_dot(&e3, &p1);
        let e3_p2 = minkowski_dot(&e3, &p2);
        let p1_e2 = minkowski_dot(&p1, &e2);
        let e2_p3 = minkowski_dot(&e2, &p3);
        let e3_e2 = minkowski_dot(&e3, &e2);

        for mu in 0..4 {
            let term = e3_e2 * (p3[mu] - p2[mu]) + e2[mu] * (e3_p2 - e3_p1) + e3[mu] * (p1_e2 - e2_p3);
            v1[2 + mu] = (denom * term).mul_i();
        }
        v1
    }
}

#[cfg(test)]
mod tests {
    use num::Complex;

    use super::{vvv1::off_shell_v1, *};
    use crate::{
        momentum::{FourMomentum, Helicity, Sign},
        wavefunctions::vector_boson,
    };

    #[test]
    fn antisymmetric_under_exchange_of_inputs() {
        let k2 = FourMomentum::from_args(500.0, 0.0, 0.0, 500.0);
        let k3 = FourMomentum::from_args(500.0, 0.0, 0.0, -500.0);
        let coup = ComplexLane::splat(Complex::new(-1.2, 0.0));
        for h2 in [Helicity::Minus, Helicity::Plus] {
            for h3 in [Helicity::Minus, Helicity::Plus] {
                let v2 = vector_boson::<f64>(&k2, 0.0, h2, Sign::Negative);
                let v3 = vector_boson::<f64>(&k3, 0.0, h3, Sign::Negative);
                let a = off_shell_v1(&v2, &v3, coup, 0.0, 0.0);
                let b = off_shell_v1(&v3, &v2, coup, 0.0, 0.0);
                assert_eq!(a.flow_momentum(), b.flow_momentum());
                for mu in 2..6 {
                    assert!((a[mu] + b[mu]).lane(0).norm() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn current_is_conserved_for_physical_polarisations() {
        // p1 · V1 = 0 when both inputs are on-shell and transverse
        let k2 = FourMomentum::from_args(13.0, 3.0, 4.0, 12.0);
        let k3 = FourMomentum::from_args(5.0, 0.0, -3.0, -4.0);
        let coup = ComplexLane::splat(Complex::new(1.0, 0.0));
        for h2 in [Helicity::Minus, Helicity::Plus] {
            for h3 in [Helicity::Minus, Helicity::Plus] {
                let v2 = vector_boson::<f64>(&k2, 0.0, h2, Sign::Positive);
                let v3 = vector_boson::<f64>(&k3, 0.0, h3, Sign::Positive);
                let v1 = off_shell_v1(&v2, &v3, coup, 0.0, 0.0);
                let p1 = to_complex(&v1.flow_momentum());
                let divergence = minkowski_dot(&p1, &v1.spin()).lane(0);
                let scale = v1.spin().iter().map(|c| c.lane(0).norm()).fold(0.0, f64::max);
                assert!(divergence.norm() < 1e-12 * scale.max(1.0) * 13.0, "{:?} {:?}", h2, h3);
            }
        }
    }
}
