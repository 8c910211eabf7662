//! # Lieper Core Library
//!
//! Canonical perturbation theory for Hamiltonian dynamical systems, built on the
//! classical Lie-transform method (a generalization of Deprit's algorithm).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** The [`Series`](core::series::Series) abstraction,
//!   explicit truncation policies, a reference Poisson-series implementation, and the
//!   stateless Lie machinery (Poisson bracket, Lie derivative, Lie series).
//!
//! - **[`engine`]: The Logic Core.** The stateful order-by-order construction of
//!   averaged Hamiltonians, generating functions and direct/inverse transforms
//!   ([`PerturbationTheory`](engine::theory::PerturbationTheory)), together with the
//!   Lie derivative cache, the injected solver strategies, and the initial-condition
//!   and evaluation subsystem.
//!
//! - **[`workflows`]: The Public API.** High-level entry points that construct a theory
//!   and propagate initial conditions over a time grid.

pub mod core;
pub mod engine;
pub mod workflows;
