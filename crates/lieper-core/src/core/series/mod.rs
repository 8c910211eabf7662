//! # Series Module
//!
//! The algebraic interface consumed by the Lie machinery and the perturbation engine.
//!
//! Any multivariate series type can drive the engine as long as it implements
//! [`Series`]: ring arithmetic, partial differentiation, substitution, degree queries,
//! degree-based filtering, truncation under an explicit [`Truncation`] policy, and
//! numerical evaluation. The crate ships [`PoissonSeries`] as a reference
//! implementation with exact rational coefficients.

mod key;
mod poisson;
mod truncation;

pub use key::{Flavor, Key};
pub use poisson::{Integrable, PoissonSeries, TermSpec};
pub use truncation::Truncation;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use thiserror::Error;

/// Numerical values of named symbols, ordered by name.
pub type StateDict = BTreeMap<String, f64>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("No value provided for symbol '{0}'")]
    MissingVariable(String),

    #[error("Series is not invertible: {0}")]
    NotInvertible(String),

    #[error("Unsupported substitution of '{var}': {reason}")]
    UnsupportedSubstitution { var: String, reason: String },

    #[error("Cannot integrate with respect to '{var}': {reason}")]
    NotIntegrable { var: String, reason: String },

    #[error("Truncation error: {0}")]
    Truncation(String),

    #[error("Invalid coefficient '{0}'")]
    InvalidCoefficient(String),
}

/// A multivariate symbolic series over named variables.
///
/// Values are owned and cloned freely; no aliasing contract is assumed. Truncation is
/// never ambient: callers pass a [`Truncation`] to [`Series::truncated`] after the
/// operations whose results they want bounded.
pub trait Series:
    Clone
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    fn zero() -> Self;

    fn one() -> Self;

    fn is_zero(&self) -> bool;

    /// The series consisting of the single symbol `name` with unit coefficient.
    fn symbol(name: &str) -> Self;

    fn from_integer(value: i64) -> Self;

    /// The constant `numer / denom`. `denom` must be non-zero.
    fn from_ratio(numer: i64, denom: i64) -> Self;

    /// Integer exponentiation; negative exponents require an invertible series.
    fn pow(&self, exponent: i32) -> Result<Self, SeriesError>;

    fn partial(&self, var: &str) -> Self;

    fn substitute(&self, var: &str, replacement: &Self) -> Result<Self, SeriesError>;

    /// Highest exponent of `var` over all terms (0 for the zero series).
    fn degree(&self, var: &str) -> i32;

    /// Minimum total degree over all terms, `None` for the zero series.
    fn order(&self) -> Option<i32>;

    /// Minimum degree in the given symbols over all terms, `None` for the zero series.
    fn partial_order(&self, vars: &[String]) -> Option<i32>;

    /// Keeps only the terms whose exponent of `var` satisfies `predicate`.
    fn filter_by_degree<F>(&self, var: &str, predicate: F) -> Self
    where
        F: Fn(i32) -> bool;

    /// True when `var` occurs only as a polynomial (never inside a trigonometric argument).
    fn is_polynomial_in(&self, var: &str) -> bool;

    fn truncated(&self, policy: &Truncation) -> Self;

    fn evaluate(&self, values: &StateDict) -> Result<f64, SeriesError>;

    /// The piece of homogeneous degree `degree` in `var`, with `var` replaced by one.
    fn homogeneous_piece(&self, var: &str, degree: i32) -> Result<Self, SeriesError> {
        self.filter_by_degree(var, |d| d == degree)
            .substitute(var, &Self::one())
    }
}

/// `1 / n!` as a series constant.
pub fn inverse_factorial<S: Series>(n: usize) -> S {
    let mut acc = S::one();
    for k in 2..=n {
        acc = acc * S::from_ratio(1, k as i64);
    }
    acc
}
