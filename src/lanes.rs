//! Arithmetic that reads the same for one event or for a fixed-width group of
//! events.
//!
//! Every kernel in the crate is generic over [`Lane`]. `f64` is the scalar
//! lane; `wide::f64x4` evaluates four events with identical control flow.
//! Per-event branching goes through [`Lane::select`], which always receives
//! both candidates already computed.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use num::Complex;
use wide::{f64x4, CmpEq, CmpGt, CmpLt};

pub trait LaneMask: Copy + Send + Sync + Debug {
    fn and(self, other: Self) -> Self;
    fn or(self, other: Self) -> Self;
    fn any(self) -> bool;
    fn all(self) -> bool;
}

impl LaneMask for bool {
    #[inline(always)]
    fn and(self, other: Self) -> Self {
        self && other
    }
    #[inline(always)]
    fn or(self, other: Self) -> Self {
        self || other
    }
    #[inline(always)]
    fn any(self) -> bool {
        self
    }
    #[inline(always)]
    fn all(self) -> bool {
        self
    }
}

impl LaneMask for f64x4 {
    #[inline(always)]
    fn and(self, other: Self) -> Self {
        self & other
    }
    #[inline(always)]
    fn or(self, other: Self) -> Self {
        self | other
    }
    #[inline(always)]
    fn any(self) -> bool {
        self.move_mask() != 0
    }
    #[inline(always)]
    fn all(self) -> bool {
        self.move_mask() == 0b1111
    }
}

pub trait Lane:
    Copy
    + Send
    + Sync
    + Debug
    + Default
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Number of events carried by one value.
    const WIDTH: usize;
    type Mask: LaneMask;

    fn splat(value: f64) -> Self;

    /// Gathers one value per lane.
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self;

    /// Extracts lane `index`.
    fn lane(self, index: usize) -> f64;

    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;

    fn simd_eq(self, other: Self) -> Self::Mask;
    fn simd_lt(self, other: Self) -> Self::Mask;
    fn simd_gt(self, other: Self) -> Self::Mask;

    /// Per-lane `if mask { on_true } else { on_false }`.
    fn select(mask: Self::Mask, on_true: Self, on_false: Self) -> Self;

    #[inline(always)]
    fn zero() -> Self {
        Self::splat(0.0)
    }

    #[inline(always)]
    fn one() -> Self {
        Self::splat(1.0)
    }

    /// Replaces lanes equal to zero by one, so the value can be used as a
    /// divisor in a branch that `select` later discards for those lanes.
    #[inline(always)]
    fn nonzero_or_one(self) -> Self {
        Self::select(self.simd_eq(Self::zero()), Self::one(), self)
    }

    fn to_vec(self) -> Vec<f64> {
        (0..Self::WIDTH).map(|i| self.lane(i)).collect()
    }
}

impl Lane for f64 {
    const WIDTH: usize = 1;
    type Mask = bool;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        value
    }
    #[inline(always)]
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        f(0)
    }
    #[inline(always)]
    fn lane(self, _index: usize) -> f64 {
        self
    }
    #[inline(always)]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    #[inline(always)]
    fn abs(self) -> Self {
        f64::abs(self)
    }
    #[inline(always)]
    fn min(self, other: Self) -> Self {
        f64::min(self, other)
    }
    #[inline(always)]
    fn max(self, other: Self) -> Self {
        f64::max(self, other)
    }
    #[inline(always)]
    fn simd_eq(self, other: Self) -> bool {
        self == other
    }
    #[inline(always)]
    fn simd_lt(self, other: Self) -> bool {
        self < other
    }
    #[inline(always)]
    fn simd_gt(self, other: Self) -> bool {
        self > other
    }
    #[inline(always)]
    fn select(mask: bool, on_true: Self, on_false: Self) -> Self {
        if mask {
            on_true
        } else {
            on_false
        }
    }
}

impl Lane for f64x4 {
    const WIDTH: usize = 4;
    type Mask = f64x4;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        f64x4::splat(value)
    }
    #[inline(always)]
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        f64x4::from([f(0), f(1), f(2), f(3)])
    }
    #[inline(always)]
    fn lane(self, index: usize) -> f64 {
        self.to_array()[index]
    }
    #[inline(always)]
    fn sqrt(self) -> Self {
        f64x4::sqrt(self)
    }
    #[inline(always)]
    fn abs(self) -> Self {
        f64x4::abs(self)
    }
    #[inline(always)]
    fn min(self, other: Self) -> Self {
        f64x4::min(self, other)
    }
    #[inline(always)]
    fn max(self, other: Self) -> Self {
        f64x4::max(self, other)
    }
    #[inline(always)]
    fn simd_eq(self, other: Self) -> f64x4 {
        CmpEq::cmp_eq(self, other)
    }
    #[inline(always)]
    fn simd_lt(self, other: Self) -> f64x4 {
        CmpLt::cmp_lt(self, other)
    }
    #[inline(always)]
    fn simd_gt(self, other: Self) -> f64x4 {
        CmpGt::cmp_gt(self, other)
    }
    #[inline(always)]
    fn select(mask: f64x4, on_true: Self, on_false: Self) -> Self {
        mask.blend(on_true, on_false)
    }
}

/// Complex number whose parts are lanes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComplexLane<L> {
    pub re: L,
    pub im: L,
}

impl<L: Lane> ComplexLane<L> {
    #[inline(always)]
    pub fn new(re: L, im: L) -> Self {
        ComplexLane { re, im }
    }

    #[inline(always)]
    pub fn from_real(re: L) -> Self {
        ComplexLane { re, im: L::zero() }
    }

    #[inline(always)]
    pub fn zero() -> Self {
        ComplexLane {
            re: L::zero(),
            im: L::zero(),
        }
    }

    #[inline(always)]
    pub fn i() -> Self {
        ComplexLane {
            re: L::zero(),
            im: L::one(),
        }
    }

    /// Same complex constant in every lane.
    #[inline(always)]
    pub fn splat(value: Complex<f64>) -> Self {
        ComplexLane {
            re: L::splat(value.re),
            im: L::splat(value.im),
        }
    }

    #[inline(always)]
    pub fn real(self) -> L {
        self.re
    }

    #[inline(always)]
    pub fn imag(self) -> L {
        self.im
    }

    #[inline(always)]
    pub fn conj(self) -> Self {
        ComplexLane {
            re: self.re,
            im: -self.im,
        }
    }

    #[inline(always)]
    pub fn norm_sqr(self) -> L {
        self.re * self.re + self.im * self.im
    }

    /// Multiplication by `i`.
    #[inline(always)]
    pub fn mul_i(self) -> Self {
        ComplexLane {
            re: -self.im,
            im: self.re,
        }
    }

    #[inline(always)]
    pub fn select(mask: L::Mask, on_true: Self, on_false: Self) -> Self {
        ComplexLane {
            re: L::select(mask, on_true.re, on_false.re),
            im: L::select(mask, on_true.im, on_false.im),
        }
    }

    pub fn lane(self, index: usize) -> Complex<f64> {
        Complex::new(self.re.lane(index), self.im.lane(index))
    }
}

impl<L: Lane> Add for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        ComplexLane::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl<L: Lane> Sub for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        ComplexLane::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl<L: Lane> Mul for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        ComplexLane::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl<L: Lane> Div for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        let denom = rhs.norm_sqr();
        ComplexLane::new(
            (self.re * rhs.re + self.im * rhs.im) / denom,
            (self.im * rhs.re - self.re * rhs.im) / denom,
        )
    }
}

impl<L: Lane> Neg for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        ComplexLane::new(-self.re, -self.im)
    }
}

impl<L: Lane> Add<L> for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: L) -> Self {
        ComplexLane::new(self.re + rhs, self.im)
    }
}

impl<L: Lane> Sub<L> for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: L) -> Self {
        ComplexLane::new(self.re - rhs, self.im)
    }
}

impl<L: Lane> Mul<L> for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: L) -> Self {
        ComplexLane::new(self.re * rhs, self.im * rhs)
    }
}

impl<L: Lane> Div<L> for ComplexLane<L> {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: L) -> Self {
        ComplexLane::new(self.re / rhs, self.im / rhs)
    }
}

impl<L: Lane> AddAssign for ComplexLane<L> {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl<L: Lane> SubAssign for ComplexLane<L> {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        self.re -= rhs.re;
        self.im -= rhs.im;
    }
}

impl<L: Lane> MulAssign for ComplexLane<L> {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_evaluates_per_lane() {
        let x = f64x4::from([0.0, 2.0, 0.0, -3.0]);
        let safe = x.nonzero_or_one();
        assert_eq!(safe.to_array(), [1.0, 2.0, 1.0, -3.0]);

        let inverse = f64x4::one() / safe;
        let result = Lane::select(x.simd_eq(f64x4::zero()), f64x4::zero(), inverse);
        assert_eq!(result.to_array(), [0.0, 0.5, 0.0, -1.0 / 3.0]);
        assert!(result.to_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn masks() {
        let x = f64x4::from([1.0, -1.0, 0.0, 4.0]);
        assert!(x.simd_gt(f64x4::zero()).any());
        assert!(!x.simd_gt(f64x4::zero()).all());
        assert!(x
            .simd_gt(f64x4::splat(-2.0))
            .and(x.simd_lt(f64x4::splat(5.0)))
            .all());
        assert!(x.simd_lt(f64x4::zero()).or(x.simd_eq(f64x4::zero())).any());
        assert!(!(1.0_f64).simd_lt(0.0).or(false));
    }

    #[test]
    fn complex_arithmetic_matches_num() {
        let a = Complex::new(1.5, -0.25);
        let b = Complex::new(-0.75, 2.0);

        let la = ComplexLane::<f64x4>::splat(a);
        let lb = ComplexLane::<f64x4>::splat(b);

        for i in 0..4 {
            assert_eq!((la * lb).lane(i), a * b);
            assert_eq!((la + lb).lane(i), a + b);
            assert_eq!((la - lb).lane(i), a - b);
            assert!(((la / lb).lane(i) - a / b).norm() < 1e-15);
            assert_eq!(la.conj().lane(i), a.conj());
            assert_eq!(la.mul_i().lane(i), a * Complex::i());
        }

        let scalar = ComplexLane::<f64>::new(3.0, 4.0);
        assert_eq!(scalar.norm_sqr(), 25.0);
        assert_eq!(scalar.real(), 3.0);
        assert_eq!(scalar.imag(), 4.0);
        assert_eq!((scalar * 2.0).lane(0), Complex::new(6.0, 8.0));
    }

    #[test]
    fn gather_and_extract() {
        let v = f64x4::from_fn(|i| i as f64 * 1.5);
        assert_eq!(v.to_vec(), vec![0.0, 1.5, 3.0, 4.5]);
        assert_eq!(<f64 as Lane>::from_fn(|i| i as f64 + 7.0), 7.0);
        assert_eq!(Lane::sqrt(f64x4::splat(16.0)).lane(2), 4.0);
        assert_eq!(Lane::max(-2.0_f64, 1.0), 1.0);
    }
}
