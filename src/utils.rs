use colored::Colorize;
use eyre::eyre;
use num::Complex;

#[allow(unused_imports)]
use log::{debug, info};

pub mod test_utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Approximate comparison with a scale-aware tolerance.
///
/// Differences are measured against `max(1, |a|, |b|)`, so the tolerance is
/// relative for large values and absolute close to zero.
pub trait ApproxEq<U, T> {
    fn approx_eq(&self, other: &U, tolerance: &T) -> bool;

    fn approx_eq_res(&self, other: &U, tolerance: &T) -> color_eyre::Result<()>;
}

#[inline]
fn scale(a: f64, b: f64) -> f64 {
    a.max(b).max(1.0)
}

impl ApproxEq<f64, f64> for f64 {
    fn approx_eq(&self, other: &f64, tolerance: &f64) -> bool {
        (self - other).abs() <= tolerance * scale(self.abs(), other.abs())
    }

    fn approx_eq_res(&self, other: &f64, tolerance: &f64) -> color_eyre::Result<()> {
        if self.approx_eq(other, tolerance) {
            Ok(())
        } else {
            Err(eyre!(
                "{} != {} (difference {:e}, tolerance {:e})",
                self,
                other,
                (self - other).abs(),
                tolerance
            ))
        }
    }
}

impl ApproxEq<Complex<f64>, f64> for Complex<f64> {
    fn approx_eq(&self, other: &Complex<f64>, tolerance: &f64) -> bool {
        (self - other).norm() <= tolerance * scale(self.norm(), other.norm())
    }

    fn approx_eq_res(&self, other: &Complex<f64>, tolerance: &f64) -> color_eyre::Result<()> {
        if self.approx_eq(other, tolerance) {
            Ok(())
        } else {
            Err(eyre!(
                "{} != {} (difference {:e}, tolerance {:e})",
                self,
                other,
                (self - other).norm(),
                tolerance
            ))
        }
    }
}

pub fn print_banner() {
    info!(
        "\n{} {}\n",
        "helamp".bold().blue(),
        format!("v{}", VERSION).green()
    );
}
