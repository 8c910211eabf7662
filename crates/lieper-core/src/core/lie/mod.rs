//! # Lie Module
//!
//! Stateless canonical-transformation machinery over any [`Series`](crate::core::series::Series):
//! the Poisson bracket on a validated [`PhaseSpace`], the repeated Lie derivative
//! `L_χ f = {f, χ}`, and the Lie series `exp(ε L_χ) f`.

pub mod bracket;
pub mod transform;

pub use bracket::{PhaseSpace, is_canonical, poisson_bracket};
pub use transform::{lie_derivative, lie_series};

use crate::core::series::SeriesError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LieError {
    #[error("Argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error(transparent)]
    Series(#[from] SeriesError),
}
