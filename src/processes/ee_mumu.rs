//! e+ e- > mu+ mu- through s-channel photon and Z exchange.
//!
//! Beams run along the z axis and the muons leave with nonzero transverse
//! momentum, so the axis-aligned massless constructors apply.

use num::Complex;

use crate::{
    momentum::Sign,
    topology::{
        AmplitudeCall, ColorContribution, ColorMatrix, ExternalKind, ExternalLeg, OffShellCall,
        ProcessTopology, Step,
    },
};

use super::TRANSVERSE;

pub const GC_3: usize = 0;
pub const GC_50: usize = 1;
pub const GC_59: usize = 2;

pub const ZERO: usize = 0;
pub const MZ: usize = 1;
pub const WZ: usize = 2;

const LEGS: &[ExternalLeg] = &[
    ExternalLeg {
        name: "e+",
        kind: ExternalKind::FermionOutMasslessPlusZ,
        mass: ZERO,
        flow: Sign::Negative,
        helicities: TRANSVERSE,
    },
    ExternalLeg {
        name: "e-",
        kind: ExternalKind::FermionInMasslessMinusZ,
        mass: ZERO,
        flow: Sign::Positive,
        helicities: TRANSVERSE,
    },
    ExternalLeg {
        name: "mu+",
        kind: ExternalKind::FermionInMasslessTransverse,
        mass: ZERO,
        flow: Sign::Negative,
        helicities: TRANSVERSE,
    },
    ExternalLeg {
        name: "mu-",
        kind: ExternalKind::FermionOutMasslessTransverse,
        mass: ZERO,
        flow: Sign::Positive,
        helicities: TRANSVERSE,
    },
];

const MINUS_ONE: Complex<f64> = Complex { re: -1.0, im: 0.0 };

const STEPS: &[Step] = &[
    Step::OffShell {
        call: OffShellCall::Ffv1V3,
        inputs: [1, 0],
        couplings: &[GC_3],
        mass: ZERO,
        width: ZERO,
        output: 4,
    },
    Step::Amplitude {
        call: AmplitudeCall::Ffv1,
        inputs: [2, 3, 4],
        couplings: &[GC_3],
        color: &[ColorContribution {
            flow: 0,
            coefficient: MINUS_ONE,
        }],
    },
    Step::OffShell {
        call: OffShellCall::Ffv2_4V3,
        inputs: [1, 0],
        couplings: &[GC_50, GC_59],
        mass: MZ,
        width: WZ,
        output: 4,
    },
    Step::Amplitude {
        call: AmplitudeCall::Ffv2_4,
        inputs: [2, 3, 4],
        couplings: &[GC_50, GC_59],
        color: &[ColorContribution {
            flow: 0,
            coefficient: MINUS_ONE,
        }],
    },
];

pub const TOPOLOGY: ProcessTopology = ProcessTopology {
    name: "e+ e- > mu+ mu-",
    legs: LEGS,
    n_wavefunctions: 5,
    steps: STEPS,
    color: ColorMatrix {
        matrix: &[&[1.0]],
        denominators: &[1.0],
    },
    averaging_denominator: 4.0,
    coupling_names: &["GC_3", "GC_50", "GC_59"],
    parameter_names: &["ZERO", "MZ", "WZ"],
};
