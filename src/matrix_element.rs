//! Batched evaluation of one process.
//!
//! A [`MatrixElement`] goes through two phases. The first call to
//! [`MatrixElement::sigma_kin`] evaluates every helicity configuration on the
//! batch it is given and keeps the ones that contribute; every call,
//! including the first, then sums only those configurations for each event.
//! Events are split into `league_size` teams of `team_size` events, each team
//! is one rayon task, and inside a team events are processed `L::WIDTH` at a
//! time.

use std::marker::PhantomData;

use color_eyre::Report;
use colored::Colorize;
use log::{info, warn};
use num::Complex;
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    buffer::{BufferError, MirroredBuffer},
    helicity::{discover, gather_event_momenta, GoodHelicities, HelicityTable},
    lanes::Lane,
    model::{Model, ModelError, ParameterCard, ProcessConstants},
    topology::{accumulate_helicity, ProcessTopology, Workspace},
    utils, ProcessSettings,
};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Process '{0}' has not been initialised")]
    NotInitialised(&'static str),
    #[error("Process '{0}' has already been initialised")]
    AlreadyInitialised(&'static str),
    #[error("Team size {team_size} is not a positive multiple of the lane width {width}")]
    TeamSize { team_size: usize, width: usize },
    #[error("League size must be positive")]
    EmptyLeague,
    #[error("{n_events} events do not fill whole lane groups of width {width}")]
    PartialLaneGroup { n_events: usize, width: usize },
    #[error("Momentum buffer holds {actual} values, expected {expected} for {n_events} events")]
    MomentumSize {
        expected: usize,
        actual: usize,
        n_events: usize,
    },
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Could not build the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub struct MatrixElement<L: Lane> {
    topology: &'static ProcessTopology,
    settings: ProcessSettings,
    helicities: HelicityTable,
    model: Option<Model>,
    couplings: MirroredBuffer<Complex<f64>>,
    mass_parameters: MirroredBuffer<f64>,
    /// What the kernels read, taken from the device copies after upload.
    device_constants: Option<ProcessConstants>,
    external_masses: Vec<f64>,
    good_helicities: Option<GoodHelicities>,
    good_buffer: MirroredBuffer<usize>,
    initial_state: Option<(i32, i32)>,
    pool: Option<rayon::ThreadPool>,
    lane: PhantomData<L>,
}

impl<L: Lane> MatrixElement<L> {
    pub fn new(
        topology: &'static ProcessTopology,
        settings: ProcessSettings,
    ) -> Result<Self, ProcessError> {
        if settings.team_size == 0 || settings.team_size % L::WIDTH != 0 {
            return Err(ProcessError::TeamSize {
                team_size: settings.team_size,
                width: L::WIDTH,
            });
        }
        if settings.league_size == 0 {
            return Err(ProcessError::EmptyLeague);
        }
        let pool = match settings.threads {
            Some(n) => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
            None => None,
        };

        Ok(MatrixElement {
            topology,
            helicities: HelicityTable::from_topology(topology),
            model: None,
            couplings: MirroredBuffer::new("couplings", topology.coupling_names.len()),
            mass_parameters: MirroredBuffer::new("mass_parameters", topology.parameter_names.len()),
            device_constants: None,
            external_masses: vec![],
            good_helicities: None,
            good_buffer: MirroredBuffer::new("good_helicities", 0),
            initial_state: None,
            pool,
            settings,
            lane: PhantomData,
        })
    }

    /// Reads the parameter card at `path` and initialises the process from it.
    pub fn init_proc(&mut self, path: &str) -> Result<(), Report> {
        if self.model.is_some() {
            return Err(ProcessError::AlreadyInitialised(self.topology.name).into());
        }
        let card = ParameterCard::from_file(path.to_string())?;
        self.init_with_parameters(&card)?;
        Ok(())
    }

    pub fn init_with_parameters(&mut self, card: &ParameterCard) -> Result<(), ProcessError> {
        if self.model.is_some() {
            return Err(ProcessError::AlreadyInitialised(self.topology.name));
        }
        self.init_with_model(Model::from_parameter_card(card)?)
    }

    /// Initialises the process from an already derived model, which may carry
    /// overridden couplings.
    pub fn init_with_model(&mut self, model: Model) -> Result<(), ProcessError> {
        if self.model.is_some() {
            return Err(ProcessError::AlreadyInitialised(self.topology.name));
        }
        let constants = self.topology.resolve_constants(&model)?;

        if self.settings.verbose {
            utils::print_banner();
            info!(
                "Initialising '{}' for batches of {} events ({} x {}, lane width {})",
                self.topology.name.green(),
                self.batch_size(),
                self.settings.league_size,
                self.settings.team_size,
                L::WIDTH
            );
            model.print_parameters();
            model.print_couplings();
        }

        self.external_masses = self.topology.external_masses(&constants);
        self.couplings.set_host(constants.couplings);
        self.couplings.upload();
        self.mass_parameters.set_host(constants.masses);
        self.mass_parameters.upload();
        self.device_constants = Some(ProcessConstants {
            couplings: self.couplings.device()?.to_vec(),
            masses: self.mass_parameters.device()?.to_vec(),
        });
        self.model = Some(model);
        Ok(())
    }

    /// Records the incoming flavour codes.
    pub fn set_initial(&mut self, id1: i32, id2: i32) {
        self.initial_state = Some((id1, id2));
    }

    fn constants(&self) -> Result<&ProcessConstants, ProcessError> {
        self.device_constants
            .as_ref()
            .ok_or(ProcessError::NotInitialised(self.topology.name))
    }

    fn check_momenta(&self, momenta: &[f64], n_events: usize) -> Result<(), ProcessError> {
        let expected = n_events * self.topology.n_external() * 4;
        if momenta.len() != expected {
            return Err(ProcessError::MomentumSize {
                expected,
                actual: momenta.len(),
                n_events,
            });
        }
        Ok(())
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Runs the helicity filter on the device copy of `momenta`, which may
    /// hold any number of events that is a multiple of the lane width.
    pub fn discover_good_helicities(
        &mut self,
        momenta: &MirroredBuffer<f64>,
    ) -> Result<&GoodHelicities, ProcessError> {
        let constants = self.constants()?;
        let p = momenta.device()?;
        let n_events = p.len() / (self.topology.n_external() * 4);
        self.check_momenta(p, n_events)?;
        if n_events % L::WIDTH != 0 {
            return Err(ProcessError::PartialLaneGroup {
                n_events,
                width: L::WIDTH,
            });
        }

        let topology = self.topology;
        let table = &self.helicities;
        let report = self.settings.debug;
        let good = self.install(|| discover::<L>(topology, constants, table, p, report));

        if good.is_empty() {
            warn!(
                "No helicity configuration of '{}' contributes on the probe batch, every event will evaluate to zero",
                self.topology.name
            );
        } else if self.settings.verbose {
            info!(
                "{} of {} helicity configurations contribute: {:?}",
                good.len(),
                self.helicities.ncomb(),
                good.indices()
            );
        }

        self.good_buffer.set_host(good.indices().to_vec());
        self.good_buffer.upload();
        Ok(self.good_helicities.insert(good))
    }

    /// Evaluates |M|², averaged over initial and summed over final discrete
    /// quantum numbers, for every event of the batch.
    ///
    /// Reads the device copy of `momenta` and writes the device copy of
    /// `output`, which must hold one value per event.
    pub fn sigma_kin(
        &mut self,
        momenta: &MirroredBuffer<f64>,
        output: &mut MirroredBuffer<f64>,
    ) -> Result<(), ProcessError> {
        self.constants()?;
        let n_events = self.batch_size();
        self.check_momenta(momenta.device()?, n_events)?;
        output.check_len(n_events)?;

        if self.good_helicities.is_none() {
            self.discover_good_helicities(momenta)?;
        }

        let constants = self.constants()?;
        let topology = self.topology;
        let team_size = self.settings.team_size;
        let stride = topology.n_external() * 4;
        let good = self.good_buffer.device()?;
        let p = momenta.device()?;
        let out = output.device_mut()?;
        let table = &self.helicities;

        self.install(|| {
            out.par_chunks_mut(team_size)
                .zip(p.par_chunks(team_size * stride))
                .for_each(|(team_out, team_momenta)| {
                    let mut workspace = Workspace::new(topology);
                    for (group, group_out) in team_out.chunks_mut(L::WIDTH).enumerate() {
                        let event_momenta = gather_event_momenta::<L>(
                            team_momenta,
                            group * L::WIDTH,
                            topology.n_external(),
                        );
                        let mut accumulator = L::zero();
                        for ihel in good {
                            accumulate_helicity(
                                topology,
                                constants,
                                &event_momenta,
                                table.get(*ihel),
                                &mut workspace,
                                &mut accumulator,
                            );
                        }
                        let value = accumulator / L::splat(topology.averaging_denominator);
                        for (lane, slot) in group_out.iter_mut().enumerate() {
                            *slot = value.lane(lane);
                        }
                    }
                });
        });
        Ok(())
    }

    pub fn topology(&self) -> &'static ProcessTopology {
        self.topology
    }

    /// Mass of each external particle.
    pub fn masses(&self) -> Result<&[f64], ProcessError> {
        self.constants()?;
        Ok(&self.external_masses)
    }

    pub fn couplings(&self) -> Result<&[Complex<f64>], ProcessError> {
        self.model
            .as_ref()
            .ok_or(ProcessError::NotInitialised(self.topology.name))?;
        Ok(self.couplings.host()?)
    }

    pub fn parameters(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn helicities(&self) -> &HelicityTable {
        &self.helicities
    }

    pub fn good_helicities(&self) -> Option<&GoodHelicities> {
        self.good_helicities.as_ref()
    }

    pub fn initial_state(&self) -> Option<(i32, i32)> {
        self.initial_state
    }

    pub fn batch_size(&self) -> usize {
        self.settings.league_size * self.settings.team_size
    }

    pub fn n_iterations(&self) -> usize {
        self.settings.n_iterations
    }

    pub fn settings(&self) -> &ProcessSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use wide::f64x4;

    use super::*;
    use crate::processes::{ee_mumu, gg_ttx};

    fn settings(league_size: usize, team_size: usize) -> ProcessSettings {
        ProcessSettings {
            league_size,
            team_size,
            ..ProcessSettings::default()
        }
    }

    #[test]
    fn construction_checks_the_team_size() {
        assert!(matches!(
            MatrixElement::<f64x4>::new(&gg_ttx::TOPOLOGY, settings(2, 6)),
            Err(ProcessError::TeamSize {
                team_size: 6,
                width: 4
            })
        ));
        assert!(matches!(
            MatrixElement::<f64>::new(&gg_ttx::TOPOLOGY, settings(2, 0)),
            Err(ProcessError::TeamSize { .. })
        ));
        assert!(matches!(
            MatrixElement::<f64>::new(&gg_ttx::TOPOLOGY, settings(0, 4)),
            Err(ProcessError::EmptyLeague)
        ));
        let me = MatrixElement::<f64x4>::new(&gg_ttx::TOPOLOGY, settings(3, 8)).unwrap();
        assert_eq!(me.batch_size(), 24);
        assert_eq!(me.helicities().ncomb(), 16);
    }

    #[test]
    fn initialisation_is_required_once() {
        let mut me = MatrixElement::<f64>::new(&gg_ttx::TOPOLOGY, settings(1, 4)).unwrap();
        let momenta = MirroredBuffer::new("momenta", 4 * 4 * 4);
        let mut output = MirroredBuffer::new("output", 4);
        assert!(matches!(
            me.sigma_kin(&momenta, &mut output),
            Err(ProcessError::NotInitialised(_))
        ));
        assert!(me.masses().is_err());

        me.init_with_parameters(&ParameterCard::default()).unwrap();
        assert!(matches!(
            me.init_with_parameters(&ParameterCard::default()),
            Err(ProcessError::AlreadyInitialised(_))
        ));
        assert!(me.init_proc("/nonexistent/param_card.yaml").is_err());
        assert_eq!(me.masses().unwrap(), &[0.0, 0.0, 173.0, 173.0]);
        assert_eq!(me.couplings().unwrap().len(), 2);
        assert!(me.parameters().is_some());

        me.set_initial(21, 21);
        assert_eq!(me.initial_state(), Some((21, 21)));
    }

    #[test]
    fn buffer_sizes_are_checked() {
        let mut me = MatrixElement::<f64>::new(&gg_ttx::TOPOLOGY, settings(1, 4)).unwrap();
        me.init_with_parameters(&ParameterCard::default()).unwrap();

        let mut output = MirroredBuffer::new("output", 4);
        let short = MirroredBuffer::new("momenta", 4 * 4 * 3);
        assert!(matches!(
            me.sigma_kin(&short, &mut output),
            Err(ProcessError::MomentumSize { n_events: 4, .. })
        ));

        let stale = MirroredBuffer::from_host("momenta", vec![0.0; 4 * 4 * 4]);
        assert!(matches!(
            me.sigma_kin(&stale, &mut output),
            Err(ProcessError::Buffer(BufferError::StaleDevice(_)))
        ));

        let momenta = MirroredBuffer::new("momenta", 4 * 4 * 4);
        let mut wrong_output = MirroredBuffer::new("output", 5);
        assert!(matches!(
            me.sigma_kin(&momenta, &mut wrong_output),
            Err(ProcessError::Buffer(BufferError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn masses_are_given_per_external_particle() {
        let mut me = MatrixElement::<f64>::new(&ee_mumu::TOPOLOGY, settings(1, 4)).unwrap();
        me.init_with_parameters(&ParameterCard::default()).unwrap();
        assert_eq!(me.masses().unwrap(), &[0.0; 4]);

        let card = ParameterCard {
            top_mass: 172.5,
            ..ParameterCard::default()
        };
        let mut me = MatrixElement::<f64x4>::new(&gg_ttx::TOPOLOGY, settings(1, 4)).unwrap();
        me.init_with_parameters(&card).unwrap();
        assert_eq!(me.masses().unwrap().len(), gg_ttx::TOPOLOGY.n_external());
        assert_eq!(me.masses().unwrap(), &[0.0, 0.0, 172.5, 172.5]);
    }

    #[test]
    fn discovery_needs_whole_lane_groups() {
        let mut me = MatrixElement::<f64x4>::new(&gg_ttx::TOPOLOGY, settings(1, 4)).unwrap();
        me.init_with_parameters(&ParameterCard::default()).unwrap();

        let three_events = MirroredBuffer::new("momenta", 3 * 4 * 4);
        assert!(matches!(
            me.discover_good_helicities(&three_events),
            Err(ProcessError::PartialLaneGroup {
                n_events: 3,
                width: 4
            })
        ));

        let ragged = MirroredBuffer::new("momenta", 4 * 4 * 4 + 2);
        assert!(matches!(
            me.discover_good_helicities(&ragged),
            Err(ProcessError::MomentumSize {
                expected: 64,
                actual: 66,
                n_events: 4
            })
        ));
        assert!(me.good_helicities().is_none());
    }
}
