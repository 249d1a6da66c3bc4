// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Symgraph: acyclic command graphs and genetic operators for symbolic
//! regression.
//!
//! This crate provides the chromosome layer of a symbolic regression engine:
//! - [`agraph::CommandGraph`], a formula stored as a flat list of commands
//! - single-point crossover and four-strategy mutation over those graphs
//! - [`floats::MultipleFloatChromosome`], a flat list of floats
//! - [`optimization::ContinuousLocalOptimization`], the contract through which
//!   an external optimizer fills in numerical constants
//!
//! Every random draw goes through an explicit random source supplied by the
//! caller, so runs are reproducible from a seed.

pub mod agraph;
pub mod error;
pub mod floats;
pub mod optimization;

pub use error::{Error, Result};
