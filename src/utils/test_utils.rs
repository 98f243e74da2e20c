//! Deterministic kinematics for tests and benchmarks.

use std::f64::consts::PI;

use crate::momentum::FourMomentum;

/// A 2 → 2 configuration in the centre-of-mass frame.
///
/// The massless incoming particles travel along +z and -z with energy
/// `e_beam` each. The outgoing particles share the mass `m_out` and leave
/// back to back, the first one along the polar angle `theta` and azimuth
/// `phi`.
pub fn two_to_two(e_beam: f64, m_out: f64, theta: f64, phi: f64) -> [FourMomentum<f64>; 4] {
    let p_out = (e_beam * e_beam - m_out * m_out).sqrt();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let outgoing = FourMomentum::from_args(
        e_beam,
        p_out * sin_theta * cos_phi,
        p_out * sin_theta * sin_phi,
        p_out * cos_theta,
    );
    [
        FourMomentum::from_args(e_beam, 0.0, 0.0, e_beam),
        FourMomentum::from_args(e_beam, 0.0, 0.0, -e_beam),
        outgoing,
        FourMomentum::from_args(e_beam, -outgoing.px(), -outgoing.py(), -outgoing.pz()),
    ]
}

/// Lays events out as `[event][particle][component]`.
pub fn flatten<const N: usize>(events: &[[FourMomentum<f64>; N]]) -> Vec<f64> {
    events
        .iter()
        .flat_map(|event| event.iter().flat_map(|p| p.to_array()))
        .collect()
}

/// `n_events` 2 → 2 events on a fixed grid of scattering angles.
pub fn angular_scan(n_events: usize, e_beam: f64, m_out: f64) -> Vec<[FourMomentum<f64>; 4]> {
    (0..n_events)
        .map(|i| {
            let x = (i as f64 + 0.5) / n_events as f64;
            let cos_theta = 0.95 * (2.0 * x - 1.0);
            let phi = 2.0 * PI * ((7 * i) % 11) as f64 / 11.0;
            two_to_two(e_beam, m_out, cos_theta.acos(), phi)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn momentum_is_conserved_and_on_shell() {
        let [k1, k2, p3, p4] = two_to_two(500.0, 173.0, 0.7, 0.3);
        let balance = k1 + k2 - p3 - p4;
        for component in balance.to_array() {
            assert!(component.abs() < 1e-12);
        }
        assert!(k1.square().abs() < 1e-9);
        assert!((p3.square() - 173.0 * 173.0).abs() < 1e-8);
        assert!((p4.square() - 173.0 * 173.0).abs() < 1e-8);
    }

    #[test]
    fn flattened_layout() {
        let events = angular_scan(3, 45.0, 0.0);
        let flat = flatten(&events);
        assert_eq!(flat.len(), 3 * 4 * 4);
        assert_eq!(flat[(2 * 4 + 3) * 4 + 1], events[2][3].px());
    }
}
