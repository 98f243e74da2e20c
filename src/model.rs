use ahash::RandomState;
use color_eyre::{Help, Report};
use colored::Colorize;
use eyre::{eyre, Context};
use log::info;
use num::Complex;
use serde::{Deserialize, Serialize};
use smartstring::{LazyCompact, SmartString};
use std::f64::consts::{PI, SQRT_2};
use std::{collections::HashMap, fs::File};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Coupling '{0}' not found in model '{1}'")]
    UnknownCoupling(String, String),
    #[error("Parameter '{0}' not found in model '{1}'")]
    UnknownParameter(String, String),
    #[error("Unphysical value {value} for '{name}': {reason}")]
    Unphysical {
        name: String,
        value: f64,
        reason: &'static str,
    },
}

const fn _default_alpha_s() -> f64 {
    0.118
}
const fn _default_top_mass() -> f64 {
    173.0
}
const fn _default_top_width() -> f64 {
    1.4915
}
const fn _default_z_mass() -> f64 {
    91.188
}
const fn _default_z_width() -> f64 {
    2.441404
}
const fn _default_alpha_ew_inverse() -> f64 {
    132.507
}
const fn _default_fermi_constant() -> f64 {
    1.16639e-5
}
fn _default_model_name() -> SmartString<LazyCompact> {
    SmartString::from("sm")
}

/// External inputs of the model, as read from a parameter card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterCard {
    #[serde(default = "_default_model_name")]
    pub name: SmartString<LazyCompact>,
    #[serde(rename = "aS", default = "_default_alpha_s")]
    pub alpha_s: f64,
    #[serde(rename = "MT", default = "_default_top_mass")]
    pub top_mass: f64,
    #[serde(rename = "WT", default = "_default_top_width")]
    pub top_width: f64,
    #[serde(rename = "MZ", default = "_default_z_mass")]
    pub z_mass: f64,
    #[serde(rename = "WZ", default = "_default_z_width")]
    pub z_width: f64,
    #[serde(rename = "aEWM1", default = "_default_alpha_ew_inverse")]
    pub alpha_ew_inverse: f64,
    #[serde(rename = "Gf", default = "_default_fermi_constant")]
    pub fermi_constant: f64,
}

impl Default for ParameterCard {
    fn default() -> Self {
        ParameterCard {
            name: _default_model_name(),
            alpha_s: _default_alpha_s(),
            top_mass: _default_top_mass(),
            top_width: _default_top_width(),
            z_mass: _default_z_mass(),
            z_width: _default_z_width(),
            alpha_ew_inverse: _default_alpha_ew_inverse(),
            fermi_constant: _default_fermi_constant(),
        }
    }
}

impl ParameterCard {
    pub fn from_file(file_path: String) -> Result<ParameterCard, Report> {
        let f = File::open(file_path.clone())
            .wrap_err_with(|| format!("Could not open parameter card yaml file {}", file_path))
            .suggestion("Does the path exist?")?;
        serde_yaml::from_reader(f)
            .map_err(|e| eyre!(format!("Error parsing parameter card yaml: {}", e)))
            .suggestion("Is it a correct yaml file")
    }

    pub fn from_yaml_str(yaml_str: String) -> Result<ParameterCard, Report> {
        serde_yaml::from_str(yaml_str.as_str())
            .map_err(|e| eyre!(format!("Error parsing parameter card yaml: {}", e)))
            .suggestion("Is it a correct yaml file")
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum ParameterNature {
    #[default]
    #[serde(rename = "external")]
    External,
    #[serde(rename = "internal")]
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: SmartString<LazyCompact>,
    pub nature: ParameterNature,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coupling {
    pub name: SmartString<LazyCompact>,
    pub value: Complex<f64>,
}

/// Numerical model: external and derived parameters together with the
/// couplings the processes refer to by name.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: SmartString<LazyCompact>,
    pub parameters: Vec<Parameter>,
    pub couplings: Vec<Coupling>,
    pub parameter_name_to_position: HashMap<SmartString<LazyCompact>, usize, RandomState>,
    pub coupling_name_to_position: HashMap<SmartString<LazyCompact>, usize, RandomState>,
}

impl Default for Model {
    fn default() -> Self {
        Model {
            name: SmartString::<LazyCompact>::from("ModelNotLoaded"),
            parameters: vec![],
            couplings: vec![],
            parameter_name_to_position:
                HashMap::<SmartString<LazyCompact>, usize, RandomState>::default(),
            coupling_name_to_position:
                HashMap::<SmartString<LazyCompact>, usize, RandomState>::default(),
        }
    }
}

fn unphysical(name: &str, value: f64, reason: &'static str) -> ModelError {
    ModelError::Unphysical {
        name: name.to_string(),
        value,
        reason,
    }
}

impl Model {
    /// Derives the internal parameters and the couplings from the card.
    pub fn from_parameter_card(card: &ParameterCard) -> Result<Model, ModelError> {
        if card.alpha_s < 0.0 {
            return Err(unphysical("aS", card.alpha_s, "the strong coupling must be non-negative"));
        }
        if card.alpha_ew_inverse <= 0.0 {
            return Err(unphysical(
                "aEWM1",
                card.alpha_ew_inverse,
                "the inverse electroweak coupling must be positive",
            ));
        }

        let g = 2.0 * (PI * card.alpha_s).sqrt();
        let alpha_ew = 1.0 / card.alpha_ew_inverse;
        let mz2 = card.z_mass * card.z_mass;
        let discriminant = mz2 * mz2 / 4.0 - alpha_ew * PI * mz2 / (card.fermi_constant * SQRT_2);
        if discriminant < 0.0 || discriminant.is_nan() {
            return Err(unphysical(
                "Gf",
                card.fermi_constant,
                "no real W mass solves the electroweak input relation",
            ));
        }
        let w_mass = (mz2 / 2.0 + discriminant.sqrt()).sqrt();
        let ee = 2.0 * alpha_ew.sqrt() * PI.sqrt();
        let sw2 = 1.0 - w_mass * w_mass / mz2;
        let cw = w_mass / card.z_mass;
        let sw = sw2.sqrt();

        let mut model = Model {
            name: card.name.clone(),
            ..Model::default()
        };

        use ParameterNature::{External, Internal};
        for (name, nature, value) in [
            ("ZERO", Internal, 0.0),
            ("aS", External, card.alpha_s),
            ("MT", External, card.top_mass),
            ("WT", External, card.top_width),
            ("MZ", External, card.z_mass),
            ("WZ", External, card.z_width),
            ("aEWM1", External, card.alpha_ew_inverse),
            ("Gf", External, card.fermi_constant),
            ("G", Internal, g),
            ("aEW", Internal, alpha_ew),
            ("MW", Internal, w_mass),
            ("ee", Internal, ee),
            ("sw2", Internal, sw2),
            ("cw", Internal, cw),
            ("sw", Internal, sw),
        ] {
            model.push_parameter(Parameter {
                name: name.into(),
                nature,
                value,
            });
        }

        let i = Complex::i();
        for (name, value) in [
            ("GC_10", Complex::new(-g, 0.0)),
            ("GC_11", i * g),
            ("GC_3", -i * ee),
            ("GC_50", -i * cw * ee / (2.0 * sw)),
            ("GC_59", i * ee * sw / (2.0 * cw)),
        ] {
            model.push_coupling(Coupling {
                name: name.into(),
                value,
            });
        }

        Ok(model)
    }

    fn push_parameter(&mut self, parameter: Parameter) {
        self.parameter_name_to_position
            .insert(parameter.name.clone(), self.parameters.len());
        self.parameters.push(parameter);
    }

    fn push_coupling(&mut self, coupling: Coupling) {
        self.coupling_name_to_position
            .insert(coupling.name.clone(), self.couplings.len());
        self.couplings.push(coupling);
    }

    #[inline]
    pub fn get_parameter(&self, name: &str) -> Result<&Parameter, ModelError> {
        if let Some(position) = self.parameter_name_to_position.get(name) {
            Ok(&self.parameters[*position])
        } else {
            Err(ModelError::UnknownParameter(
                name.to_string(),
                self.name.to_string(),
            ))
        }
    }

    #[inline]
    pub fn get_coupling(&self, name: &str) -> Result<&Coupling, ModelError> {
        if let Some(position) = self.coupling_name_to_position.get(name) {
            Ok(&self.couplings[*position])
        } else {
            Err(ModelError::UnknownCoupling(
                name.to_string(),
                self.name.to_string(),
            ))
        }
    }

    /// Overrides the value of an existing coupling.
    pub fn set_coupling(&mut self, name: &str, value: Complex<f64>) -> Result<(), ModelError> {
        match self.coupling_name_to_position.get(name) {
            Some(position) => {
                self.couplings[*position].value = value;
                Ok(())
            }
            None => Err(ModelError::UnknownCoupling(
                name.to_string(),
                self.name.to_string(),
            )),
        }
    }

    pub fn print_parameters(&self) {
        info!(
            "{}",
            format!("Parameters of model '{}'", self.name).bold().blue()
        );
        for parameter in self.parameters.iter() {
            info!(
                "  {:<8} = {:<+24.16e} {}",
                parameter.name.as_str().green(),
                parameter.value,
                match parameter.nature {
                    ParameterNature::External => "external".normal(),
                    ParameterNature::Internal => "internal".dimmed(),
                }
            );
        }
    }

    pub fn print_couplings(&self) {
        info!("{}", "Couplings".bold().blue());
        for coupling in self.couplings.iter() {
            info!(
                "  {:<8} = ({:+.16e}, {:+.16e})",
                coupling.name.as_str().green(),
                coupling.value.re,
                coupling.value.im
            );
        }
    }
}

/// Couplings and masses of one process, in the order its topology names
/// them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessConstants {
    pub couplings: Vec<Complex<f64>>,
    pub masses: Vec<f64>,
}

impl ProcessConstants {
    pub fn resolve(
        model: &Model,
        coupling_names: &[&str],
        parameter_names: &[&str],
    ) -> Result<ProcessConstants, ModelError> {
        let couplings = coupling_names
            .iter()
            .map(|name| model.get_coupling(name).map(|c| c.value))
            .collect::<Result<Vec<_>, _>>()?;
        let masses = parameter_names
            .iter()
            .map(|name| model.get_parameter(name).map(|p| p.value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProcessConstants { couplings, masses })
    }
}
