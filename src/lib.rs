#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
// #![deny(clippy::all)]
// #![warn(clippy::pedantic)]
#![warn(clippy::all)]
pub mod buffer;
pub mod helicity;
pub mod lanes;
pub mod matrix_element;
pub mod model;
pub mod momentum;
pub mod processes;
pub mod topology;
pub mod utils;
pub mod vertices;
pub mod wavefunctions;


use color_eyre::{Help, Report};
use eyre::{eyre, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::File;

pub use matrix_element::{MatrixElement, ProcessError};

const fn _default_n_iterations() -> usize {
    1
}
const fn _default_league_size() -> usize {
    1
}
const fn _default_team_size() -> usize {
    32
}
const fn _default_false() -> bool {
    false
}
const fn _default_usize_null() -> Option<usize> {
    None
}

/// Run configuration of a [`MatrixElement`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessSettings {
    #[serde(default = "_default_n_iterations")]
    pub n_iterations: usize,
    /// Number of teams per batch.
    #[serde(default = "_default_league_size")]
    pub league_size: usize,
    /// Events per team; a multiple of the lane width.
    #[serde(default = "_default_team_size")]
    pub team_size: usize,
    #[serde(default = "_default_false")]
    pub verbose: bool,
    #[serde(default = "_default_false")]
    pub debug: bool,
    /// Size of a dedicated thread pool, the global rayon pool otherwise.
    #[serde(default = "_default_usize_null")]
    pub threads: Option<usize>,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        ProcessSettings {
            n_iterations: _default_n_iterations(),
            league_size: _default_league_size(),
            team_size: _default_team_size(),
            verbose: _default_false(),
            debug: _default_false(),
            threads: _default_usize_null(),
        }
    }
}

impl ProcessSettings {
    pub fn from_file(filename: &str) -> Result<ProcessSettings, Report> {
        let f = File::open(filename)
            .wrap_err_with(|| format!("Could not open settings file {}", filename))
            .suggestion("Does the path exist?")?;
        serde_yaml::from_reader(f)
            .map_err(|e| eyre!(format!("Error parsing settings yaml: {}", e)))
            .suggestion("Is it a correct yaml file")
    }

    pub fn from_yaml_str(yaml_str: &str) -> Result<ProcessSettings, Report> {
        serde_yaml::from_str(yaml_str)
            .map_err(|e| eyre!(format!("Error parsing settings yaml: {}", e)))
            .suggestion("Is it a correct yaml file")
    }

    pub fn batch_size(&self) -> usize {
        self.league_size * self.team_size
    }
}
