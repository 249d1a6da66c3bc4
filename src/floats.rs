//! Chromosomes made of a flat list of floats.
//!
//! A subset of positions can be flagged for continuous local optimization;
//! those positions are the optimizer's slots and every other value is left to
//! the genetic operators.

use crate::error::{Error, Result};
use crate::optimization::ContinuousLocalOptimization;
use rand::RngCore;
use std::fmt;

/// A list of float values with optional optimizer-owned positions.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleFloatChromosome {
    values: Vec<f64>,
    needs_opt_list: Vec<usize>,
    genetic_age: u64,
    fitness: Option<f64>,
}

impl MultipleFloatChromosome {
    /// Create a chromosome.
    ///
    /// `needs_opt_list` is sorted and de-duplicated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if an index is out of range for
    /// `values`.
    pub fn new(values: Vec<f64>, needs_opt_list: &[usize]) -> Result<Self> {
        let needs_opt_list = sorted_unique(needs_opt_list);
        if let Some(&index) = needs_opt_list.last()
            && index >= values.len()
        {
            return Err(Error::invalid_input(format!(
                "optimization index {index} out of range for {} values",
                values.len()
            )));
        }
        Ok(Self {
            values,
            needs_opt_list,
            genetic_age: 0,
            fitness: None,
        })
    }

    /// The genetic values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable access to the genetic values; clears the fitness cache.
    pub fn values_mut(&mut self) -> &mut [f64] {
        self.fitness = None;
        &mut self.values
    }

    /// Positions owned by the optimizer, ascending.
    #[must_use]
    pub fn needs_opt_list(&self) -> &[usize] {
        &self.needs_opt_list
    }

    /// Generation count this lineage has survived.
    #[must_use]
    pub fn genetic_age(&self) -> u64 {
        self.genetic_age
    }

    /// Overwrite the genetic age.
    pub fn set_genetic_age(&mut self, age: u64) {
        self.genetic_age = age;
    }

    /// Cached fitness, if evaluated since the last change.
    #[must_use]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Cache a fitness value.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }
}

impl ContinuousLocalOptimization for MultipleFloatChromosome {
    fn get_number_local_optimization_params(&self) -> usize {
        self.needs_opt_list.len()
    }

    fn set_local_optimization_params(&mut self, params: &[f64]) {
        for (&index, &value) in self.needs_opt_list.iter().zip(params) {
            self.values[index] = value;
            self.fitness = None;
        }
    }
}

/// Builds [`MultipleFloatChromosome`]s from a value function.
pub struct MultipleFloatChromosomeGenerator<F> {
    random_value: F,
    values_per_chromosome: usize,
    needs_opt_list: Vec<usize>,
}

impl<F> fmt::Debug for MultipleFloatChromosomeGenerator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipleFloatChromosomeGenerator")
            .field("values_per_chromosome", &self.values_per_chromosome)
            .field("needs_opt_list", &self.needs_opt_list)
            .finish_non_exhaustive()
    }
}

impl<F: Fn(&mut dyn RngCore) -> f64> MultipleFloatChromosomeGenerator<F> {
    /// Create a generator.
    ///
    /// `random_value` is called once with `rng` to check that it produces a
    /// finite float.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if an optimization index is not below
    /// `values_per_chromosome` or the probe value is not finite.
    pub fn new<R: RngCore>(
        random_value: F,
        values_per_chromosome: usize,
        needs_opt_list: &[usize],
        rng: &mut R,
    ) -> Result<Self> {
        let needs_opt_list = sorted_unique(needs_opt_list);
        if let Some(&index) = needs_opt_list.last()
            && index >= values_per_chromosome
        {
            return Err(Error::validation(format!(
                "optimization index {index} out of range for {values_per_chromosome} values"
            )));
        }

        let probe = random_value(rng as &mut dyn RngCore);
        if !probe.is_finite() {
            return Err(Error::validation(format!(
                "random value function must produce finite floats, got {probe}"
            )));
        }

        log::debug!(
            "float chromosome generator: {values_per_chromosome} values, optimizing {needs_opt_list:?}"
        );
        Ok(Self {
            random_value,
            values_per_chromosome,
            needs_opt_list,
        })
    }

    /// Number of values in generated chromosomes.
    #[must_use]
    pub fn values_per_chromosome(&self) -> usize {
        self.values_per_chromosome
    }

    /// Generate a chromosome with age 0 and no fitness.
    pub fn generate<R: RngCore>(&self, rng: &mut R) -> MultipleFloatChromosome {
        let rng: &mut dyn RngCore = rng;
        let values = (0..self.values_per_chromosome)
            .map(|_| (self.random_value)(&mut *rng))
            .collect();
        MultipleFloatChromosome {
            values,
            needs_opt_list: self.needs_opt_list.clone(),
            genetic_age: 0,
            fitness: None,
        }
    }
}

fn sorted_unique(indices: &[usize]) -> Vec<usize> {
    let mut indices = indices.to_vec();
    indices.sort_unstable();
    indices.dedup();
    indices
}
