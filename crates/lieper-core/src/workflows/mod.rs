//! # Workflows Module
//!
//! High-level entry points that tie the engine together.
//!
//! - **Construction** ([`construct`]) - Builds a theory and attaches its mean-flow strategy.
//! - **Propagation** ([`propagate`]) - Maps initial conditions through a theory and
//!   evaluates the state on a time grid.

pub mod construct;
pub mod propagate;
