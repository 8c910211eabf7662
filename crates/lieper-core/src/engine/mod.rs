//! # Engine Module
//!
//! The stateful side of the library: order-by-order construction of a Lie-transform
//! perturbation theory and the evaluation of its solutions.
//!
//! ## Overview
//!
//! A [`PerturbationTheory`](theory::PerturbationTheory) is built from a Hamiltonian, a
//! [`TheoryConfig`](config::TheoryConfig) and one
//! [`HomologicalSolver`](solver::HomologicalSolver) per order. Each step decomposes the
//! current Hamiltonian by powers of the small parameter, asks the solver for a generating
//! function, reconstructs the next Hamiltonian with memoized Lie derivatives
//! ([`LieCache`](cache::LieCache)) and records the direct and inverse transformations of
//! the state variables.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Symbols, phase space and truncation policy
//! - **Theory** ([`theory`]) - Construction, initial conditions and evaluation
//! - **Strategies** ([`solver`], [`strategy`]) - Injected homological solvers and mean flows
//! - **State** ([`state`]) - Transforms, state dictionaries and the initial-condition chain
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod cache;
pub mod config;
pub mod error;
pub mod progress;
pub mod solver;
pub mod state;
pub mod strategy;
pub mod theory;
