//! Helicity enumeration and the one-off filter for contributing
//! configurations.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::{
    lanes::{Lane, LaneMask},
    model::ProcessConstants,
    momentum::{FourMomentum, Helicity},
    topology::{accumulate_helicity, ProcessTopology, Workspace, MAX_WAVEFUNCTIONS},
};

/// All helicity configurations of a process, first particle slowest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelicityTable {
    n_external: usize,
    combinations: Vec<Helicity>,
}

impl HelicityTable {
    pub fn from_topology(topology: &ProcessTopology) -> Self {
        let combinations = topology
            .legs
            .iter()
            .map(|leg| leg.helicities.iter().copied())
            .multi_cartesian_product()
            .flatten()
            .collect();
        HelicityTable {
            n_external: topology.n_external(),
            combinations,
        }
    }

    /// Number of configurations.
    pub fn ncomb(&self) -> usize {
        if self.n_external == 0 {
            0
        } else {
            self.combinations.len() / self.n_external
        }
    }

    pub fn n_external(&self) -> usize {
        self.n_external
    }

    pub fn get(&self, index: usize) -> &[Helicity] {
        &self.combinations[index * self.n_external..(index + 1) * self.n_external]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Helicity]> {
        self.combinations.chunks(self.n_external)
    }

    pub fn index_of(&self, helicities: &[Helicity]) -> Option<usize> {
        self.iter().position(|h| h == helicities)
    }
}

/// Indices of the configurations that contribute, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoodHelicities {
    indices: SmallVec<[usize; 32]>,
}

impl GoodHelicities {
    pub fn all(ncomb: usize) -> Self {
        GoodHelicities {
            indices: (0..ncomb).collect(),
        }
    }

    pub fn from_indices(indices: &[usize]) -> Self {
        GoodHelicities {
            indices: indices.iter().copied().collect(),
        }
    }

    pub fn from_flags(flags: &[AtomicBool]) -> Self {
        GoodHelicities {
            indices: flags
                .iter()
                .enumerate()
                .filter(|(_, flag)| flag.load(Ordering::Relaxed))
                .map(|(i, _)| i)
                .collect(),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn is_superset_of(&self, other: &GoodHelicities) -> bool {
        other.indices.iter().all(|i| self.contains(*i))
    }
}

/// Gathers the external momenta of the lane group starting at `first_event`.
#[inline]
pub(crate) fn gather_event_momenta<L: Lane>(
    momenta: &[f64],
    first_event: usize,
    n_external: usize,
) -> SmallVec<[FourMomentum<L>; MAX_WAVEFUNCTIONS]> {
    (0..n_external)
        .map(|particle| FourMomentum::gather(momenta, first_event, particle, n_external))
        .collect()
}

/// Evaluates every configuration in index order over the probe batch and
/// keeps those that change the accumulator of at least one event.
///
/// `momenta` holds `n_events` events laid out as `[event][particle][E, px,
/// py, pz]`; `n_events` must be a multiple of the lane width.
pub fn discover<L: Lane>(
    topology: &ProcessTopology,
    constants: &ProcessConstants,
    table: &HelicityTable,
    momenta: &[f64],
    report: bool,
) -> GoodHelicities {
    let n_external = topology.n_external();
    let stride = n_external * 4 * L::WIDTH;
    let flags: Vec<AtomicBool> = (0..table.ncomb()).map(|_| AtomicBool::new(false)).collect();

    momenta.par_chunks(stride).for_each(|group| {
        let p = gather_event_momenta::<L>(group, 0, n_external);
        let mut workspace = Workspace::new(topology);
        let mut accumulator = L::zero();
        for (ihel, helicities) in table.iter().enumerate() {
            let before = accumulator;
            accumulate_helicity(
                topology,
                constants,
                &p,
                helicities,
                &mut workspace,
                &mut accumulator,
            );
            if !accumulator.simd_eq(before).all() {
                flags[ihel].store(true, Ordering::Relaxed);
            }
        }
    });

    if report {
        for (ihel, helicities) in table.iter().enumerate() {
            let configuration = helicities.iter().map(|h| h.to_string()).join(" ");
            debug!(
                "helicity #{:<3} [ {} ] {}",
                ihel,
                configuration,
                if flags[ihel].load(Ordering::Relaxed) {
                    "good".green()
                } else {
                    "zero".red()
                }
            );
        }
    }

    GoodHelicities::from_flags(&flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processes::gg_ttx;

    #[test]
    fn enumeration_order() {
        let table = HelicityTable::from_topology(&gg_ttx::TOPOLOGY);
        assert_eq!(table.ncomb(), 16);
        assert_eq!(table.n_external(), 4);
        assert_eq!(table.get(0), &[Helicity::Minus; 4]);
        assert_eq!(
            table.get(1),
            &[Helicity::Minus, Helicity::Minus, Helicity::Minus, Helicity::Plus]
        );
        assert_eq!(
            table.get(8),
            &[Helicity::Plus, Helicity::Minus, Helicity::Minus, Helicity::Minus]
        );
        assert_eq!(table.get(15), &[Helicity::Plus; 4]);
        assert_eq!(table.index_of(table.get(11)), Some(11));
        assert_eq!(table.iter().count(), 16);
    }

    #[test]
    fn good_sets_from_flags() {
        let flags: Vec<AtomicBool> = [false, true, true, false, true]
            .into_iter()
            .map(AtomicBool::new)
            .collect();
        let good = GoodHelicities::from_flags(&flags);
        assert_eq!(good.indices(), &[1, 2, 4]);
        assert_eq!(good.len(), 3);
        assert!(good.contains(4) && !good.contains(0));
        assert!(GoodHelicities::all(5).is_superset_of(&good));
        assert!(!good.is_superset_of(&GoodHelicities::from_indices(&[0, 1])));
        assert!(GoodHelicities::default().is_empty());
    }
}
