//! External-leg wavefunctions in the chiral (HELAS) basis.
//!
//! Every wavefunction carries its flow momentum in components 0 and 1 as
//! `(E + i pz, px + i py)`, negated for incoming fermions, so that vertex
//! functions can reconstruct propagator momenta. Spinor or polarisation
//! components follow in 2..6; scalars only use component 2.
//!
//! Kinematic edge cases (particle at rest, momentum along the z axis) are
//! resolved per lane with [`Lane::select`]. Divisors that vanish in the
//! discarded branch are replaced by one before the division.

use std::ops::{Index, IndexMut};

use num::Complex;

use crate::{
    lanes::{ComplexLane, Lane, LaneMask},
    momentum::{FourMomentum, Helicity, Sign},
};

pub const WAVEFUNCTION_SIZE: usize = 6;
pub const SCALAR_WAVEFUNCTION_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Wavefunction<L> {
    pub components: [ComplexLane<L>; WAVEFUNCTION_SIZE],
}

impl<L: Lane> Wavefunction<L> {
    pub fn zero() -> Self {
        Wavefunction {
            components: [ComplexLane::zero(); WAVEFUNCTION_SIZE],
        }
    }

    /// Stores `sign * p` in the two flow components and zeroes the rest.
    #[inline]
    fn with_flow(p: &FourMomentum<L>, sign: f64) -> Self {
        let sign = L::splat(sign);
        let mut w = Self::zero();
        w.components[0] = ComplexLane::new(p.e() * sign, p.pz() * sign);
        w.components[1] = ComplexLane::new(p.px() * sign, p.py() * sign);
        w
    }

    /// Momentum stored in the flow components, `(E, px, py, pz)`.
    #[inline]
    pub fn flow_momentum(&self) -> [L; 4] {
        [
            self.components[0].re,
            self.components[1].re,
            self.components[1].im,
            self.components[0].im,
        ]
    }

    /// The four spin components 2..6.
    #[inline]
    pub fn spin(&self) -> [ComplexLane<L>; 4] {
        [
            self.components[2],
            self.components[3],
            self.components[4],
            self.components[5],
        ]
    }

    #[inline]
    fn set_spin(&mut self, spin: [ComplexLane<L>; 4]) {
        self.components[2..].copy_from_slice(&spin);
    }

    /// Component values of a single lane.
    pub fn lane(&self, index: usize) -> [Complex<f64>; WAVEFUNCTION_SIZE] {
        self.components.map(|c| c.lane(index))
    }
}

impl<L> Index<usize> for Wavefunction<L> {
    type Output = ComplexLane<L>;
    fn index(&self, index: usize) -> &Self::Output {
        &self.components[index]
    }
}

impl<L> IndexMut<usize> for Wavefunction<L> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.components[index]
    }
}

#[inline(always)]
fn re<L: Lane>(value: L) -> ComplexLane<L> {
    ComplexLane::from_real(value)
}

#[inline(always)]
fn select4<L: Lane>(
    mask: L::Mask,
    on_true: [ComplexLane<L>; 4],
    on_false: [ComplexLane<L>; 4],
) -> [ComplexLane<L>; 4] {
    [0, 1, 2, 3].map(|k| ComplexLane::select(mask, on_true[k], on_false[k]))
}

/// Both spinor components for a massless fermion whose momentum may lie
/// along -z. `conjugate_transverse` selects `px - i py` instead of `px + i py`
/// in the second component, as needed for barred spinors.
#[inline(always)]
fn massless_chi<L: Lane>(
    p: &FourMomentum<L>,
    nhel: i32,
    nsf: i32,
    conjugate_transverse: bool,
) -> [ComplexLane<L>; 2] {
    let zero = L::zero();
    let nh = (nhel * nsf) as f64;
    let along_minus_z = p
        .px()
        .simd_eq(zero)
        .and(p.py().simd_eq(zero))
        .and(p.pz().simd_lt(zero));
    let sqp0p3 = L::select(
        along_minus_z,
        zero,
        (p.e() + p.pz()).max(zero).sqrt() * L::splat(nsf as f64),
    );
    let py = if conjugate_transverse { -p.py() } else { p.py() };
    let safe = sqp0p3.nonzero_or_one();
    let chi1 = ComplexLane::select(
        sqp0p3.simd_eq(zero),
        re(L::splat(-(nhel as f64)) * (L::splat(2.0) * p.e()).sqrt()),
        ComplexLane::new(L::splat(nh) * p.px() / safe, py / safe),
    );
    [re(sqp0p3), chi1]
}

/// Spinor pair `chi` for a massive fermion with `pp > 0`, together with the
/// two `sf * omega` weights.
#[inline(always)]
fn massive_chi<L: Lane>(
    p: &FourMomentum<L>,
    pp: L,
    fmass: f64,
    nh: i32,
    nsf: i32,
    conjugate_transverse: bool,
) -> ([ComplexLane<L>; 2], [L; 2]) {
    let zero = L::zero();
    let pp = pp.nonzero_or_one();
    let sf = [
        (1 + nsf + (1 - nsf) * nh) as f64 * 0.5,
        (1 + nsf - (1 - nsf) * nh) as f64 * 0.5,
    ];
    let omega0 = (p.e() + pp).sqrt();
    let omega = [omega0, L::splat(fmass) / omega0.nonzero_or_one()];
    let ip = ((1 + nh) / 2) as usize;
    let im = ((1 - nh) / 2) as usize;
    let sfomega = [L::splat(sf[0]) * omega[ip], L::splat(sf[1]) * omega[im]];

    let pp3 = (pp + p.pz()).max(zero);
    let pp3_is_zero = pp3.simd_eq(zero);
    let py = if conjugate_transverse { -p.py() } else { p.py() };
    let norm = (L::splat(2.0) * pp * pp3.nonzero_or_one()).sqrt();
    let chi = [
        re((pp3 * L::splat(0.5) / pp).sqrt()),
        ComplexLane::select(
            pp3_is_zero,
            re(L::splat(-nh as f64)),
            ComplexLane::new(L::splat(nh as f64) * p.px() / norm, py / norm),
        ),
    ];
    (chi, sfomega)
}

#[inline(always)]
fn rest_spin_masses(fmass: f64) -> [f64; 2] {
    let sqm0 = fmass.abs().sqrt();
    [sqm0, if fmass < 0. { -sqm0 } else { sqm0 }]
}

/// Incoming fermion or outgoing antifermion: spinor column `u` or `v`.
pub fn fermion_in<L: Lane>(
    p: &FourMomentum<L>,
    fmass: f64,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nhel = helicity.as_i32();
    let nsf = flow as i32;
    let nh = nhel * nsf;
    let mut fi = Wavefunction::with_flow(p, -(nsf as f64));

    if fmass != 0. {
        let zero = L::zero();
        let pp = p.e().min(p.spatial.norm());

        let sqm = rest_spin_masses(fmass);
        let ip = ((1 + nh) / 2) as usize;
        let im = ((1 - nh) / 2) as usize;
        let at_rest = [
            re(L::splat(ip as f64 * sqm[ip])),
            re(L::splat((im as i32 * nsf) as f64 * sqm[ip])),
            re(L::splat((ip as i32 * nsf) as f64 * sqm[im])),
            re(L::splat(im as f64 * sqm[im])),
        ];

        let (chi, sfomega) = massive_chi(p, pp, fmass, nh, nsf, false);
        let moving = [
            chi[im] * sfomega[0],
            chi[ip] * sfomega[0],
            chi[im] * sfomega[1],
            chi[ip] * sfomega[1],
        ];

        fi.set_spin(select4(pp.simd_eq(zero), at_rest, moving));
    } else {
        let chi = massless_chi(p, nhel, nsf, false);
        let zero = ComplexLane::zero();
        if nh == 1 {
            fi.set_spin([zero, zero, chi[0], chi[1]]);
        } else {
            fi.set_spin([chi[1], chi[0], zero, zero]);
        }
    }
    fi
}

/// Massless incoming fermion with `px = py = 0` and `E = pz > 0`.
pub fn fermion_in_massless_plus_z<L: Lane>(
    p: &FourMomentum<L>,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nsf = flow.as_f64();
    let nh = helicity.as_i32() * flow as i32;
    let pz = p.pz();
    let mut fi = Wavefunction::zero();
    fi[0] = ComplexLane::new(-pz * L::splat(nsf), -pz * L::splat(nsf));
    let sqp0p3 = re((L::splat(2.0) * pz).sqrt() * L::splat(nsf));
    if nh == 1 {
        fi[4] = sqp0p3;
    } else {
        fi[3] = sqp0p3;
    }
    fi
}

/// Massless incoming fermion with `px = py = 0` and `E = -pz > 0`.
pub fn fermion_in_massless_minus_z<L: Lane>(
    p: &FourMomentum<L>,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nsf = flow.as_f64();
    let nh = helicity.as_i32() * flow as i32;
    let pz = p.pz();
    let mut fi = Wavefunction::zero();
    fi[0] = ComplexLane::new(pz * L::splat(nsf), -pz * L::splat(nsf));
    let chi = re(L::splat(-helicity.as_f64()) * (L::splat(-2.0) * pz).sqrt());
    if nh == 1 {
        fi[5] = chi;
    } else {
        fi[2] = chi;
    }
    fi
}

/// Massless incoming fermion not moving along -z (in particular `pT > 0`).
pub fn fermion_in_massless_transverse<L: Lane>(
    p: &FourMomentum<L>,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nsf = flow as i32;
    let nh = helicity.as_i32() * nsf;
    let mut fi = Wavefunction::with_flow(p, -(nsf as f64));
    let sqp0p3 = (p.e() + p.pz()).sqrt() * L::splat(nsf as f64);
    let chi0 = re(sqp0p3);
    let chi1 = ComplexLane::new(L::splat(nh as f64) * p.px() / sqp0p3, p.py() / sqp0p3);
    let zero = ComplexLane::zero();
    if nh == 1 {
        fi.set_spin([zero, zero, chi0, chi1]);
    } else {
        fi.set_spin([chi1, chi0, zero, zero]);
    }
    fi
}

/// Outgoing fermion or incoming antifermion: barred spinor row.
pub fn fermion_out<L: Lane>(
    p: &FourMomentum<L>,
    fmass: f64,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nhel = helicity.as_i32();
    let nsf = flow as i32;
    let nh = nhel * nsf;
    let mut fo = Wavefunction::with_flow(p, nsf as f64);

    if fmass != 0. {
        let zero = L::zero();
        let pp = p.e().min(p.spatial.norm());

        let sqm = rest_spin_masses(fmass);
        let ip = -((1 - nh) / 2) * nhel;
        let im = ((1 + nh) / 2) * nhel;
        let (abs_ip, abs_im) = (ip.unsigned_abs() as usize, im.unsigned_abs() as usize);
        let at_rest = [
            re(L::splat(im as f64 * sqm[abs_ip])),
            re(L::splat((ip * nsf) as f64 * sqm[abs_ip])),
            re(L::splat((im * nsf) as f64 * sqm[abs_im])),
            re(L::splat(ip as f64 * sqm[abs_im])),
        ];

        let ip = ((1 + nh) / 2) as usize;
        let im = ((1 - nh) / 2) as usize;
        let (chi, sfomega) = massive_chi(p, pp, fmass, nh, nsf, true);
        let moving = [
            chi[im] * sfomega[1],
            chi[ip] * sfomega[1],
            chi[im] * sfomega[0],
            chi[ip] * sfomega[0],
        ];

        fo.set_spin(select4(pp.simd_eq(zero), at_rest, moving));
    } else {
        let chi = massless_chi(p, nhel, nsf, true);
        let zero = ComplexLane::zero();
        if nh == 1 {
            fo.set_spin([chi[0], chi[1], zero, zero]);
        } else {
            fo.set_spin([zero, zero, chi[1], chi[0]]);
        }
    }
    fo
}

/// Massless outgoing fermion with `px = py = 0` and `E = pz > 0`.
pub fn fermion_out_massless_plus_z<L: Lane>(
    p: &FourMomentum<L>,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nsf = flow.as_f64();
    let nh = helicity.as_i32() * flow as i32;
    let pz = p.pz();
    let mut fo = Wavefunction::zero();
    fo[0] = ComplexLane::new(pz * L::splat(nsf), pz * L::splat(nsf));
    let csqp0p3 = re((L::splat(2.0) * pz).sqrt() * L::splat(nsf));
    if nh == 1 {
        fo[2] = csqp0p3;
    } else {
        fo[5] = csqp0p3;
    }
    fo
}

/// Massless outgoing fermion with `px = py = 0` and `E = -pz > 0`.
pub fn fermion_out_massless_minus_z<L: Lane>(
    p: &FourMomentum<L>,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nsf = flow.as_f64();
    let nh = helicity.as_i32() * flow as i32;
    let pz = p.pz();
    let mut fo = Wavefunction::zero();
    fo[0] = ComplexLane::new(-pz * L::splat(nsf), pz * L::splat(nsf));
    let chi1 = re(L::splat(-helicity.as_f64()) * (L::splat(-2.0) * pz).sqrt());
    if nh == 1 {
        fo[3] = chi1;
    } else {
        fo[4] = chi1;
    }
    fo
}

/// Massless outgoing fermion not moving along -z (in particular `pT > 0`).
pub fn fermion_out_massless_transverse<L: Lane>(
    p: &FourMomentum<L>,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let nsf = flow as i32;
    let nh = helicity.as_i32() * nsf;
    let mut fo = Wavefunction::with_flow(p, nsf as f64);
    let sqp0p3 = (p.e() + p.pz()).sqrt() * L::splat(nsf as f64);
    let chi0 = re(sqp0p3);
    let chi1 = ComplexLane::new(L::splat(nh as f64) * p.px() / sqp0p3, -p.py() / sqp0p3);
    let zero = ComplexLane::zero();
    if nh == 1 {
        fo.set_spin([chi0, chi1, zero, zero]);
    } else {
        fo.set_spin([zero, zero, chi1, chi0]);
    }
    fo
}

/// Vector boson polarisation vector (contravariant), helicity -1, 0 or +1.
pub fn vector_boson<L: Lane>(
    p: &FourMomentum<L>,
    vmass: f64,
    helicity: Helicity,
    flow: Sign,
) -> Wavefunction<L> {
    let zero = L::zero();
    let sqh = L::splat(0.5_f64.sqrt());
    let hel = L::splat(helicity.as_f64());
    let nsv = flow.as_f64();
    let mut vc = Wavefunction::with_flow(p, nsv);
    let (px, py, pz) = (p.px(), p.py(), p.pz());
    let pz_sign_sqh = L::select(pz.simd_lt(zero), -sqh, sqh);

    if vmass != 0. {
        let hel0 = L::splat(1. - helicity.as_f64().abs());
        let nsvahl = L::splat(nsv * helicity.as_f64().abs());
        let vmass = L::splat(vmass);
        let pp = p.e().min(p.spatial.norm());
        let pt = pp.min(p.pt());

        let at_rest = [
            ComplexLane::zero(),
            re(-hel * sqh),
            ComplexLane::new(zero, nsvahl * sqh),
            re(hel0),
        ];

        let pp_safe = pp.nonzero_or_one();
        let pt_safe = pt.nonzero_or_one();
        let emp = p.e() / (vmass * pp_safe);
        let pzpt = pz / (pp_safe * pt_safe) * sqh * hel;
        let transverse = [
            ComplexLane::new(hel0 * px * emp - px * pzpt, -nsvahl * py / pt_safe * sqh),
            ComplexLane::new(hel0 * py * emp - py * pzpt, nsvahl * px / pt_safe * sqh),
        ];
        let axial = [re(-hel * sqh), ComplexLane::new(zero, nsvahl * pz_sign_sqh)];
        let pt_is_zero = pt.simd_eq(zero);
        let moving = [
            re(hel0 * pp / vmass),
            ComplexLane::select(pt_is_zero, axial[0], transverse[0]),
            ComplexLane::select(pt_is_zero, axial[1], transverse[1]),
            re(hel0 * pz * emp + hel * pt / pp_safe * sqh),
        ];

        vc.set_spin(select4(pp.simd_eq(zero), at_rest, moving));
    } else {
        let nsv = L::splat(nsv);
        let pp = p.e();
        let pt = p.pt();
        let pp_safe = pp.nonzero_or_one();
        let pt_safe = pt.nonzero_or_one();
        let pzpt = pz / (pp_safe * pt_safe) * sqh * hel;
        let pt_is_zero = pt.simd_eq(zero);

        vc.set_spin([
            ComplexLane::zero(),
            ComplexLane::select(
                pt_is_zero,
                re(-hel * sqh),
                ComplexLane::new(-px * pzpt, -nsv * py / pt_safe * sqh),
            ),
            ComplexLane::select(
                pt_is_zero,
                ComplexLane::new(zero, nsv * pz_sign_sqh),
                ComplexLane::new(-py * pzpt, nsv * px / pt_safe * sqh),
            ),
            re(hel * pt / pp_safe * sqh),
        ]);
    }
    vc
}

/// Scalar boson; only the first [`SCALAR_WAVEFUNCTION_SIZE`] components are used.
pub fn scalar_boson<L: Lane>(p: &FourMomentum<L>, flow: Sign) -> Wavefunction<L> {
    let mut sc = Wavefunction::with_flow(p, flow.as_f64());
    sc[2] = ComplexLane::from_real(L::one());
    sc
}
