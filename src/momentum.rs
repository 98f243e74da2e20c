use std::fmt::Display;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

use crate::lanes::Lane;

#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Energy<T> {
    pub value: T,
}

impl<T> Energy<T> {
    pub fn new(value: T) -> Self {
        Energy { value }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThreeMomentum<T> {
    pub px: T,
    pub py: T,
    pub pz: T,
}

impl<T: Lane> ThreeMomentum<T> {
    #[inline]
    pub fn norm_squared(&self) -> T {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    #[inline]
    pub fn norm(&self) -> T {
        self.norm_squared().sqrt()
    }

    /// Compute transverse momentum.
    #[inline]
    pub fn pt(&self) -> T {
        (self.px * self.px + self.py * self.py).sqrt()
    }
}

#[derive(Default, Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct FourMomentum<T> {
    pub temporal: Energy<T>,
    pub spatial: ThreeMomentum<T>,
}

impl<T> FourMomentum<T> {
    pub fn from_args(energy: T, px: T, py: T, pz: T) -> Self {
        FourMomentum {
            temporal: Energy::new(energy),
            spatial: ThreeMomentum { px, py, pz },
        }
    }
}

impl<T: Lane> FourMomentum<T> {
    #[inline]
    pub fn e(&self) -> T {
        self.temporal.value
    }

    #[inline]
    pub fn px(&self) -> T {
        self.spatial.px
    }

    #[inline]
    pub fn py(&self) -> T {
        self.spatial.py
    }

    #[inline]
    pub fn pz(&self) -> T {
        self.spatial.pz
    }

    /// Minkowski square with metric (+,-,-,-).
    #[inline]
    pub fn square(&self) -> T {
        self.temporal.value * self.temporal.value - self.spatial.norm_squared()
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> T {
        self.temporal.value * other.temporal.value
            - self.spatial.px * other.spatial.px
            - self.spatial.py * other.spatial.py
            - self.spatial.pz * other.spatial.pz
    }

    #[inline]
    pub fn pt(&self) -> T {
        self.spatial.pt()
    }

    /// Reads particle `particle` of the events `first_event..first_event + T::WIDTH`
    /// out of a flat `[event][particle][E, px, py, pz]` buffer.
    #[inline]
    pub fn gather(momenta: &[f64], first_event: usize, particle: usize, n_external: usize) -> Self {
        let component = |mu: usize| {
            T::from_fn(|lane| momenta[((first_event + lane) * n_external + particle) * 4 + mu])
        };
        FourMomentum::from_args(component(0), component(1), component(2), component(3))
    }

    pub fn to_array(&self) -> [T; 4] {
        [
            self.temporal.value,
            self.spatial.px,
            self.spatial.py,
            self.spatial.pz,
        ]
    }
}

impl<T: Add<Output = T>> Add for FourMomentum<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        FourMomentum {
            temporal: Energy::new(self.temporal.value + rhs.temporal.value),
            spatial: ThreeMomentum {
                px: self.spatial.px + rhs.spatial.px,
                py: self.spatial.py + rhs.spatial.py,
                pz: self.spatial.pz + rhs.spatial.pz,
            },
        }
    }
}

impl<T: Sub<Output = T>> Sub for FourMomentum<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        FourMomentum {
            temporal: Energy::new(self.temporal.value - rhs.temporal.value),
            spatial: ThreeMomentum {
                px: self.spatial.px - rhs.spatial.px,
                py: self.spatial.py - rhs.spatial.py,
                pz: self.spatial.pz - rhs.spatial.pz,
            },
        }
    }
}

/// Direction of fermion-number or momentum flow through a leg.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr, Hash)]
#[repr(i8)]
pub enum Sign {
    Positive = 1,
    Negative = -1,
}

impl Sign {
    #[inline]
    pub fn as_f64(self) -> f64 {
        self as i8 as f64
    }
}

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Invalid value for Sign")]
    InvalidValue,
    #[error("Zero is not a valid value for Sign")]
    ZeroValue,
}

impl TryFrom<SignOrZero> for Sign {
    type Error = SignError;
    fn try_from(value: SignOrZero) -> Result<Self, Self::Error> {
        match value {
            SignOrZero::Zero => Err(SignError::ZeroValue),
            SignOrZero::Plus => Ok(Sign::Positive),
            SignOrZero::Minus => Ok(Sign::Negative),
        }
    }
}

impl TryFrom<i8> for Sign {
    type Error = SignError;
    fn try_from(value: i8) -> Result<Self, Self::Error> {
        SignOrZero::try_from(value).and_then(Sign::try_from)
    }
}

impl Neg for Sign {
    type Output = Self;
    fn neg(self) -> Self::Output {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

#[derive(
    Debug, PartialEq, Eq, Clone, Copy, Default, Serialize_repr, Deserialize_repr, PartialOrd, Ord, Hash,
)]
#[repr(i8)]
pub enum SignOrZero {
    #[default]
    Zero = 0,
    Plus = 1,
    Minus = -1,
}

pub type Helicity = SignOrZero;

impl SignOrZero {
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i8 as i32
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self as i8 as f64
    }
}

impl From<Sign> for SignOrZero {
    fn from(value: Sign) -> Self {
        match value {
            Sign::Positive => SignOrZero::Plus,
            Sign::Negative => SignOrZero::Minus,
        }
    }
}

impl TryFrom<i8> for SignOrZero {
    type Error = SignError;
    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SignOrZero::Zero),
            1 => Ok(SignOrZero::Plus),
            -1 => Ok(SignOrZero::Minus),
            _ => Err(SignError::InvalidValue),
        }
    }
}

impl Mul<Sign> for SignOrZero {
    type Output = SignOrZero;
    fn mul(self, rhs: Sign) -> Self::Output {
        match rhs {
            Sign::Positive => self,
            Sign::Negative => -self,
        }
    }
}

impl Neg for SignOrZero {
    type Output = Self;
    fn neg(self) -> Self::Output {
        match self {
            SignOrZero::Plus => SignOrZero::Minus,
            SignOrZero::Minus => SignOrZero::Plus,
            SignOrZero::Zero => SignOrZero::Zero,
        }
    }
}

impl Display for SignOrZero {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignOrZero::Zero => write!(f, "."),
            SignOrZero::Plus => write!(f, "+"),
            SignOrZero::Minus => write!(f, "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use wide::f64x4;

    use super::*;

    #[test]
    fn serialization() {
        let hels = vec![Helicity::Plus, Helicity::Minus, Helicity::Zero];
        let serialized = serde_json::to_string(&hels).unwrap();
        assert_eq!(serialized, "[1,-1,0]");
        let deserialized: Vec<Helicity> = serde_json::from_str("[1,-1,0,1]").unwrap();
        assert_eq!(
            deserialized,
            vec![Helicity::Plus, Helicity::Minus, Helicity::Zero, Helicity::Plus]
        );
        assert!(serde_json::from_str::<Vec<Sign>>("[1,0]").is_err());
    }

    #[test]
    fn sign_algebra() {
        assert_eq!(-Sign::Negative, Sign::Positive);
        assert_eq!(Helicity::Plus * Sign::Negative, Helicity::Minus);
        assert_eq!(Helicity::Zero * Sign::Negative, Helicity::Zero);
        assert!(matches!(Sign::try_from(0i8), Err(SignError::ZeroValue)));
        assert!(matches!(Sign::try_from(3i8), Err(SignError::InvalidValue)));
        assert_eq!(Helicity::Minus.as_f64(), -1.0);
        assert_eq!(format!("{}{}{}", Helicity::Plus, Helicity::Minus, Helicity::Zero), "+-.");
    }

    #[test]
    fn kinematics() {
        let p = FourMomentum::from_args(5.0, 1.0, 2.0, 2.0);
        assert_eq!(p.square(), 16.0);
        assert_eq!(p.pt(), 5.0_f64.sqrt());
        assert_eq!((p + p).e(), 10.0);
        assert_eq!((p - p).square(), 0.0);
        assert_eq!(p.spatial.norm(), 3.0);
        assert_eq!(p.dot(&FourMomentum::from_args(1.0, 0.0, 0.0, 1.0)), 3.0);
    }

    #[test]
    fn gather_reads_consecutive_events() {
        let n_external = 2;
        let momenta: Vec<f64> = (0..4 * n_external * 4).map(|i| i as f64).collect();

        let p = FourMomentum::<f64x4>::gather(&momenta, 0, 1, n_external);
        assert_eq!(p.e().to_array(), [4.0, 12.0, 20.0, 28.0]);
        assert_eq!(p.pz().to_array(), [7.0, 15.0, 23.0, 31.0]);

        let q = FourMomentum::<f64>::gather(&momenta, 2, 0, n_external);
        assert_eq!(q.to_array(), [16.0, 17.0, 18.0, 19.0]);
    }
}
