//! Declarative diagram tables and the routine that interprets them.
//!
//! A process is described by a [`ProcessTopology`]: how to build each
//! external wavefunction, an ordered list of vertex calls that fill
//! wavefunction slots or close diagrams, and the colour algebra that turns
//! the per-flow amplitude sums into |M|².

use num::Complex;
use smallvec::{smallvec, SmallVec};

use crate::{
    lanes::{ComplexLane, Lane},
    model::{Model, ModelError, ProcessConstants},
    momentum::{FourMomentum, Helicity, Sign},
    vertices::{ffv1, ffv2, ffv2_4, ffv4, vvv1},
    wavefunctions::{self, Wavefunction},
};

/// Inline capacity for per-evaluation scratch storage.
pub const MAX_WAVEFUNCTIONS: usize = 8;
pub const MAX_COLOR_FLOWS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    FermionIn,
    FermionInMasslessPlusZ,
    FermionInMasslessMinusZ,
    FermionInMasslessTransverse,
    FermionOut,
    FermionOutMasslessPlusZ,
    FermionOutMasslessMinusZ,
    FermionOutMasslessTransverse,
    Vector,
    Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalLeg {
    pub name: &'static str,
    pub kind: ExternalKind,
    /// Index into the process parameters.
    pub mass: usize,
    pub flow: Sign,
    /// Allowed helicities, in enumeration order.
    pub helicities: &'static [Helicity],
}

impl ExternalLeg {
    #[inline]
    pub fn wavefunction<L: Lane>(
        &self,
        p: &FourMomentum<L>,
        masses: &[f64],
        helicity: Helicity,
    ) -> Wavefunction<L> {
        let mass = masses[self.mass];
        match self.kind {
            ExternalKind::FermionIn => wavefunctions::fermion_in(p, mass, helicity, self.flow),
            ExternalKind::FermionInMasslessPlusZ => {
                wavefunctions::fermion_in_massless_plus_z(p, helicity, self.flow)
            }
            ExternalKind::FermionInMasslessMinusZ => {
                wavefunctions::fermion_in_massless_minus_z(p, helicity, self.flow)
            }
            ExternalKind::FermionInMasslessTransverse => {
                wavefunctions::fermion_in_massless_transverse(p, helicity, self.flow)
            }
            ExternalKind::FermionOut => wavefunctions::fermion_out(p, mass, helicity, self.flow),
            ExternalKind::FermionOutMasslessPlusZ => {
                wavefunctions::fermion_out_massless_plus_z(p, helicity, self.flow)
            }
            ExternalKind::FermionOutMasslessMinusZ => {
                wavefunctions::fermion_out_massless_minus_z(p, helicity, self.flow)
            }
            ExternalKind::FermionOutMasslessTransverse => {
                wavefunctions::fermion_out_massless_transverse(p, helicity, self.flow)
            }
            ExternalKind::Vector => wavefunctions::vector_boson(p, mass, helicity, self.flow),
            ExternalKind::Scalar => wavefunctions::scalar_boson(p, self.flow),
        }
    }
}

/// Vertex calls producing an off-shell wavefunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffShellCall {
    Ffv1F1,
    Ffv1F2,
    Ffv1V3,
    Ffv2V3,
    Ffv4V3,
    Ffv2_4V3,
    Vvv1V1,
}

/// Vertex calls closing a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmplitudeCall {
    Ffv1,
    Ffv2,
    Ffv4,
    Ffv2_4,
}

/// `jamp[flow] += coefficient * amp`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorContribution {
    pub flow: usize,
    pub coefficient: Complex<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    OffShell {
        call: OffShellCall,
        inputs: [usize; 2],
        /// Indices into the process couplings.
        couplings: &'static [usize],
        mass: usize,
        width: usize,
        output: usize,
    },
    Amplitude {
        call: AmplitudeCall,
        inputs: [usize; 3],
        couplings: &'static [usize],
        color: &'static [ColorContribution],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    pub matrix: &'static [&'static [f64]],
    pub denominators: &'static [f64],
}

impl ColorMatrix {
    pub fn n_flows(&self) -> usize {
        self.denominators.len()
    }

    /// `Σ_i Re((Σ_j cf_ij jamp_j) conj(jamp_i)) / denom_i`
    #[inline]
    pub fn contract<L: Lane>(&self, jamp: &[ComplexLane<L>]) -> L {
        let mut total = L::zero();
        for (i, (row, denominator)) in self.matrix.iter().zip(self.denominators).enumerate() {
            let mut ztemp = ComplexLane::zero();
            for (j, cf) in row.iter().enumerate() {
                ztemp += jamp[j] * L::splat(*cf);
            }
            total += (ztemp * jamp[i].conj()).real() / L::splat(*denominator);
        }
        total
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessTopology {
    pub name: &'static str,
    pub legs: &'static [ExternalLeg],
    /// Wavefunction slots; the first `legs.len()` hold the external legs.
    pub n_wavefunctions: usize,
    pub steps: &'static [Step],
    pub color: ColorMatrix,
    /// Spin and colour averaging of the initial state.
    pub averaging_denominator: f64,
    pub coupling_names: &'static [&'static str],
    pub parameter_names: &'static [&'static str],
}

impl ProcessTopology {
    pub fn n_external(&self) -> usize {
        self.legs.len()
    }

    pub fn n_diagrams(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Amplitude { .. }))
            .count()
    }

    pub fn resolve_constants(&self, model: &Model) -> Result<ProcessConstants, ModelError> {
        ProcessConstants::resolve(model, self.coupling_names, self.parameter_names)
    }

    /// Mass of each external leg.
    pub fn external_masses(&self, constants: &ProcessConstants) -> Vec<f64> {
        self.legs.iter().map(|leg| constants.masses[leg.mass]).collect()
    }

    /// Couplings that multiply each diagram as an overall factor, following
    /// off-shell wavefunctions back to the external legs. Vertices with a
    /// sum of couplings contribute no factor.
    pub fn diagram_coupling_factors(&self) -> Vec<SmallVec<[usize; 4]>> {
        let mut slot_couplings: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); self.n_wavefunctions];
        let mut diagrams = vec![];
        let merge = |target: &mut SmallVec<[usize; 4]>, extra: &[usize]| {
            for c in extra {
                if !target.contains(c) {
                    target.push(*c);
                }
            }
        };
        let factor = |couplings: &'static [usize]| -> &'static [usize] {
            if couplings.len() == 1 {
                couplings
            } else {
                &[]
            }
        };
        for step in self.steps {
            match *step {
                Step::OffShell {
                    inputs,
                    couplings,
                    output,
                    ..
                } => {
                    let mut used = SmallVec::new();
                    for input in inputs {
                        merge(&mut used, slot_couplings[input].as_slice());
                    }
                    merge(&mut used, factor(couplings));
                    slot_couplings[output] = used;
                }
                Step::Amplitude {
                    inputs, couplings, ..
                } => {
                    let mut used = SmallVec::new();
                    for input in inputs {
                        merge(&mut used, slot_couplings[input].as_slice());
                    }
                    merge(&mut used, factor(couplings));
                    diagrams.push(used);
                }
            }
        }
        diagrams
    }
}

/// Scratch storage reused across helicity configurations of one lane group.
#[derive(Debug, Clone)]
pub struct Workspace<L: Lane> {
    pub wavefunctions: SmallVec<[Wavefunction<L>; MAX_WAVEFUNCTIONS]>,
    pub jamp: SmallVec<[ComplexLane<L>; MAX_COLOR_FLOWS]>,
}

impl<L: Lane> Workspace<L> {
    pub fn new(topology: &ProcessTopology) -> Self {
        Workspace {
            wavefunctions: smallvec![Wavefunction::zero(); topology.n_wavefunctions],
            jamp: smallvec![ComplexLane::zero(); topology.color.n_flows()],
        }
    }
}

#[inline]
fn off_shell<L: Lane>(
    call: OffShellCall,
    a: &Wavefunction<L>,
    b: &Wavefunction<L>,
    couplings: &[ComplexLane<L>],
    mass: f64,
    width: f64,
) -> Wavefunction<L> {
    match call {
        OffShellCall::Ffv1F1 => ffv1::off_shell_f1(a, b, couplings[0], mass, width),
        OffShellCall::Ffv1F2 => ffv1::off_shell_f2(a, b, couplings[0], mass, width),
        OffShellCall::Ffv1V3 => ffv1::off_shell_v3(a, b, couplings[0], mass, width),
        OffShellCall::Ffv2V3 => ffv2::off_shell_v3(a, b, couplings[0], mass, width),
        OffShellCall::Ffv4V3 => ffv4::off_shell_v3(a, b, couplings[0], mass, width),
        OffShellCall::Ffv2_4V3 => {
            ffv2_4::off_shell_v3(a, b, couplings[0], couplings[1], mass, width)
        }
        OffShellCall::Vvv1V1 => vvv1::off_shell_v1(a, b, couplings[0], mass, width),
    }
}

#[inline]
fn amplitude<L: Lane>(
    call: AmplitudeCall,
    f1: &Wavefunction<L>,
    f2: &Wavefunction<L>,
    v3: &Wavefunction<L>,
    couplings: &[ComplexLane<L>],
) -> ComplexLane<L> {
    match call {
        AmplitudeCall::Ffv1 => ffv1::amplitude(f1, f2, v3, couplings[0]),
        AmplitudeCall::Ffv2 => ffv2::amplitude(f1, f2, v3, couplings[0]),
        AmplitudeCall::Ffv4 => ffv4::amplitude(f1, f2, v3, couplings[0]),
        AmplitudeCall::Ffv2_4 => ffv2_4::amplitude(f1, f2, v3, couplings[0], couplings[1]),
    }
}

/// Builds the external wavefunctions and runs every step, handing each
/// diagram amplitude to `on_amplitude`.
#[inline]
fn run_steps<L: Lane>(
    topology: &ProcessTopology,
    constants: &ProcessConstants,
    momenta: &[FourMomentum<L>],
    helicities: &[Helicity],
    wavefunctions: &mut [Wavefunction<L>],
    mut on_amplitude: impl FnMut(&'static [ColorContribution], ComplexLane<L>),
) {
    for (i, leg) in topology.legs.iter().enumerate() {
        wavefunctions[i] = leg.wavefunction(&momenta[i], &constants.masses, helicities[i]);
    }

    let coupling = |indices: &[usize]| -> SmallVec<[ComplexLane<L>; 2]> {
        indices
            .iter()
            .map(|c| ComplexLane::splat(constants.couplings[*c]))
            .collect()
    };

    for step in topology.steps {
        match *step {
            Step::OffShell {
                call,
                inputs,
                couplings,
                mass,
                width,
                output,
            } => {
                wavefunctions[output] = off_shell(
                    call,
                    &wavefunctions[inputs[0]],
                    &wavefunctions[inputs[1]],
                    &coupling(couplings),
                    constants.masses[mass],
                    constants.masses[width],
                );
            }
            Step::Amplitude {
                call,
                inputs,
                couplings,
                color,
            } => {
                let amp = amplitude(
                    call,
                    &wavefunctions[inputs[0]],
                    &wavefunctions[inputs[1]],
                    &wavefunctions[inputs[2]],
                    &coupling(couplings),
                );
                on_amplitude(color, amp);
            }
        }
    }
}

/// Adds the colour-summed |M|² of one helicity configuration to
/// `accumulator`. The accumulator is never reset here.
#[inline]
pub fn accumulate_helicity<L: Lane>(
    topology: &ProcessTopology,
    constants: &ProcessConstants,
    momenta: &[FourMomentum<L>],
    helicities: &[Helicity],
    workspace: &mut Workspace<L>,
    accumulator: &mut L,
) {
    for jamp in workspace.jamp.iter_mut() {
        *jamp = ComplexLane::zero();
    }
    let jamp = &mut workspace.jamp;
    run_steps(
        topology,
        constants,
        momenta,
        helicities,
        &mut workspace.wavefunctions,
        |color, amp| {
            for contribution in color {
                jamp[contribution.flow] += amp * ComplexLane::splat(contribution.coefficient);
            }
        },
    );
    *accumulator += topology.color.contract(&workspace.jamp);
}

/// Amplitude of every diagram for one helicity configuration, in table order.
pub fn diagram_amplitudes<L: Lane>(
    topology: &ProcessTopology,
    constants: &ProcessConstants,
    momenta: &[FourMomentum<L>],
    helicities: &[Helicity],
    workspace: &mut Workspace<L>,
) -> SmallVec<[ComplexLane<L>; MAX_WAVEFUNCTIONS]> {
    let mut amplitudes = SmallVec::new();
    run_steps(
        topology,
        constants,
        momenta,
        helicities,
        &mut workspace.wavefunctions,
        |_, amp| amplitudes.push(amp),
    );
    amplitudes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::{ee_mumu, gg_ttx};

    #[test]
    fn color_contraction_of_single_flows() {
        let color = gg_ttx::TOPOLOGY.color;
        let one = ComplexLane::<f64>::from_real(1.0);
        let zero = ComplexLane::zero();
        assert_eq!(color.contract(&[one, zero]), 16.0 / 3.0);
        assert_eq!(color.contract(&[zero, one.mul_i()]), 16.0 / 3.0);
        // interference between the flows enters with cf_01 + cf_10
        assert_eq!(color.contract(&[one, one]), 28.0 / 3.0);
    }

    #[test]
    fn tables_are_consistent() {
        for topology in [&gg_ttx::TOPOLOGY, &ee_mumu::TOPOLOGY] {
            let n_couplings = topology.coupling_names.len();
            let n_parameters = topology.parameter_names.len();
            for leg in topology.legs {
                assert!(leg.mass < n_parameters, "{}", topology.name);
            }
            let mut filled = topology.n_external();
            for step in topology.steps {
                match step {
                    Step::OffShell {
                        inputs,
                        couplings,
                        mass,
                        width,
                        output,
                        ..
                    } => {
                        assert!(inputs.iter().all(|i| *i < filled));
                        assert!(couplings.iter().all(|c| *c < n_couplings));
                        assert!(*mass < n_parameters && *width < n_parameters);
                        assert!(*output < topology.n_wavefunctions);
                        filled = filled.max(output + 1);
                    }
                    Step::Amplitude {
                        inputs,
                        couplings,
                        color,
                        ..
                    } => {
                        assert!(inputs.iter().all(|i| *i < filled));
                        assert!(couplings.iter().all(|c| *c < n_couplings));
                        assert!(color.iter().all(|c| c.flow < topology.color.n_flows()));
                    }
                }
            }
            assert_eq!(topology.color.matrix.len(), topology.color.n_flows());
        }
    }

    #[test]
    fn external_masses_follow_the_legs() {
        let constants = ProcessConstants {
            couplings: vec![],
            masses: vec![0.0, 173.0, 1.4915],
        };
        assert_eq!(
            gg_ttx::TOPOLOGY.external_masses(&constants),
            vec![0.0, 0.0, 173.0, 173.0]
        );
        let constants = ProcessConstants {
            couplings: vec![],
            masses: vec![0.0, 91.188, 2.441404],
        };
        assert_eq!(ee_mumu::TOPOLOGY.external_masses(&constants), vec![0.0; 4]);
    }

    #[test]
    fn coupling_factors_are_traced_through_propagators() {
        let diagrams = gg_ttx::TOPOLOGY.diagram_coupling_factors();
        assert_eq!(diagrams.len(), gg_ttx::TOPOLOGY.n_diagrams());
        assert_eq!(diagrams.len(), 3);
        // the s-channel diagram is the only one with a triple-gluon vertex
        assert!(diagrams[0].contains(&gg_ttx::GC_10));
        assert!(diagrams[0].contains(&gg_ttx::GC_11));
        assert!(!diagrams[1].contains(&gg_ttx::GC_10));
        assert!(!diagrams[2].contains(&gg_ttx::GC_10));

        let diagrams = ee_mumu::TOPOLOGY.diagram_coupling_factors();
        assert_eq!(diagrams.len(), 2);
        assert_eq!(diagrams[0].as_slice(), &[ee_mumu::GC_3]);
        assert!(diagrams[1].is_empty());
    }
}
