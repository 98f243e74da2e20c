//! g g > t t~ at leading order in QCD: s-channel gluon, t- and u-channel top.

use num::Complex;

use crate::{
    momentum::Sign,
    topology::{
        AmplitudeCall, ColorContribution, ColorMatrix, ExternalKind, ExternalLeg, OffShellCall,
        ProcessTopology, Step,
    },
};

use super::TRANSVERSE;

pub const GC_10: usize = 0;
pub const GC_11: usize = 1;

pub const ZERO: usize = 0;
pub const MT: usize = 1;
pub const WT: usize = 2;

const LEGS: &[ExternalLeg] = &[
    ExternalLeg {
        name: "g",
        kind: ExternalKind::Vector,
        mass: ZERO,
        flow: Sign::Negative,
        helicities: TRANSVERSE,
    },
    ExternalLeg {
        name: "g",
        kind: ExternalKind::Vector,
        mass: ZERO,
        flow: Sign::Negative,
        helicities: TRANSVERSE,
    },
    ExternalLeg {
        name: "t",
        kind: ExternalKind::FermionOut,
        mass: MT,
        flow: Sign::Positive,
        helicities: TRANSVERSE,
    },
    ExternalLeg {
        name: "t~",
        kind: ExternalKind::FermionIn,
        mass: MT,
        flow: Sign::Negative,
        helicities: TRANSVERSE,
    },
];

const I: Complex<f64> = Complex { re: 0.0, im: 1.0 };
const MINUS_I: Complex<f64> = Complex { re: 0.0, im: -1.0 };
const MINUS_ONE: Complex<f64> = Complex { re: -1.0, im: 0.0 };

const STEPS: &[Step] = &[
    Step::OffShell {
        call: OffShellCall::Vvv1V1,
        inputs: [0, 1],
        couplings: &[GC_10],
        mass: ZERO,
        width: ZERO,
        output: 4,
    },
    Step::Amplitude {
        call: AmplitudeCall::Ffv1,
        inputs: [3, 2, 4],
        couplings: &[GC_11],
        color: &[
            ColorContribution {
                flow: 0,
                coefficient: I,
            },
            ColorContribution {
                flow: 1,
                coefficient: MINUS_I,
            },
        ],
    },
    Step::OffShell {
        call: OffShellCall::Ffv1F1,
        inputs: [2, 0],
        couplings: &[GC_11],
        mass: MT,
        width: WT,
        output: 4,
    },
    Step::Amplitude {
        call: AmplitudeCall::Ffv1,
        inputs: [3, 4, 1],
        couplings: &[GC_11],
        color: &[ColorContribution {
            flow: 0,
            coefficient: MINUS_ONE,
        }],
    },
    Step::OffShell {
        call: OffShellCall::Ffv1F2,
        inputs: [3, 0],
        couplings: &[GC_11],
        mass: MT,
        width: WT,
        output: 4,
    },
    Step::Amplitude {
        call: AmplitudeCall::Ffv1,
        inputs: [4, 2, 1],
        couplings: &[GC_11],
        color: &[ColorContribution {
            flow: 1,
            coefficient: MINUS_ONE,
        }],
    },
];

pub const TOPOLOGY: ProcessTopology = ProcessTopology {
    name: "g g > t t~",
    legs: LEGS,
    n_wavefunctions: 5,
    steps: STEPS,
    color: ColorMatrix {
        matrix: &[&[16.0, -2.0], &[-2.0, 16.0]],
        denominators: &[3.0, 3.0],
    },
    averaging_denominator: 512.0,
    coupling_names: &["GC_10", "GC_11"],
    parameter_names: &["ZERO", "MT", "WT"],
};
