//! Process tables compiled into the crate.

pub mod ee_mumu;
pub mod gg_ttx;

use crate::{momentum::Helicity, topology::ProcessTopology};

pub(crate) const TRANSVERSE: &[Helicity] = &[Helicity::Minus, Helicity::Plus];

/// Every process available to [`crate::matrix_element::MatrixElement`].
pub const ALL: &[&ProcessTopology] = &[&gg_ttx::TOPOLOGY, &ee_mumu::TOPOLOGY];

pub fn find(name: &str) -> Option<&'static ProcessTopology> {
    ALL.iter().copied().find(|topology| topology.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(find("g g > t t~").map(|t| t.n_external()), Some(4));
        assert_eq!(find("e+ e- > mu+ mu-").map(|t| t.n_diagrams()), Some(2));
        assert!(find("u u~ > d d~").is_none());
    }
}
