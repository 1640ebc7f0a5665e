//! Run configuration for the genetic search.
//!
//! [`RunConfig`] holds the hyperparameters of one search. The node count is not
//! part of it: it is read from the distance oracle at validation time.

use crate::error::{KCenterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of top-ranked chromosomes that crossover never overwrites.
pub const ELITE_COUNT: usize = 8;

/// Smallest admissible population: the elite band plus an equally sized
/// reproducing half.
pub const MIN_POPULATION_SIZE: usize = 2 * ELITE_COUNT;

/// Genetic algorithm configuration
///
/// # Builder pattern
///
/// ```
/// use kcenter_ga::config::RunConfig;
///
/// let config = RunConfig::default()
///     .with_centers(4)
///     .with_population_size(32)
///     .with_seed(7);
/// assert_eq!(config.centers, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of chromosomes, even and at least 16
    pub population_size: usize,
    /// Number of centers `k`
    pub centers: usize,
    /// Mutation events per generation, as a fraction of the population size
    pub mutation_rate: f64,
    /// Hard cap on the number of generations
    pub max_generations: usize,
    /// Stop after this many consecutive generations with the same best score
    pub max_epochs: usize,
    /// Random seed
    pub seed: u64,
    /// Evaluate chromosomes on the rayon thread pool
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            population_size: 140,
            centers: 13,
            mutation_rate: 0.2,
            max_generations: 200,
            max_epochs: 70,
            seed: 42,
            parallel: true,
        }
    }
}

impl RunConfig {
    /// Load a configuration from a JSON file. Missing fields take their default.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_centers(mut self, k: usize) -> Self {
        self.centers = k;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_max_epochs(mut self, n: usize) -> Self {
        self.max_epochs = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Half of the population; the reproducing band and the offspring band.
    pub fn half_population(&self) -> usize {
        self.population_size / 2
    }

    /// Number of gene flips applied each generation.
    pub fn mutation_count(&self) -> usize {
        (self.mutation_rate * self.population_size as f64).round() as usize
    }

    /// Check the configuration against a graph of `node_count` nodes.
    pub fn validate(&self, node_count: usize) -> Result<()> {
        if self.centers < 1 {
            return Err(KCenterError::invalid("centers must be at least 1"));
        }
        if self.centers >= node_count {
            return Err(KCenterError::invalid(format!(
                "centers ({}) must be smaller than the node count ({})",
                self.centers, node_count
            )));
        }
        if self.population_size < MIN_POPULATION_SIZE || self.population_size % 2 != 0 {
            return Err(KCenterError::invalid(format!(
                "population_size ({}) must be even and at least {}",
                self.population_size, MIN_POPULATION_SIZE
            )));
        }
        if self.centers >= self.population_size {
            return Err(KCenterError::invalid(format!(
                "centers ({}) must be smaller than population_size ({})",
                self.centers, self.population_size
            )));
        }
        if !self.mutation_rate.is_finite() || !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(KCenterError::invalid(format!(
                "mutation_rate ({}) must lie in [0, 1]",
                self.mutation_rate
            )));
        }
        if self.max_generations < 1 {
            return Err(KCenterError::invalid("max_generations must be at least 1"));
        }
        if self.max_epochs < 1 {
            return Err(KCenterError::invalid("max_epochs must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_for_146_nodes() {
        let config = RunConfig::default();
        assert!(config.validate(146).is_ok());
        assert_eq!(config.half_population(), 70);
        assert_eq!(config.mutation_count(), 28);
    }

    #[test]
    fn test_mutation_count_rounds() {
        let config = RunConfig::default().with_population_size(16).with_mutation_rate(0.1);
        // 1.6 rounds up
        assert_eq!(config.mutation_count(), 2);
        assert_eq!(config.with_mutation_rate(0.0).mutation_count(), 0);
    }

    #[test]
    fn test_validation_rejects_bad_parameters() {
        let base = RunConfig::default().with_centers(3).with_population_size(16);
        assert!(base.validate(10).is_ok());

        let cases = vec![
            base.clone().with_centers(0),
            base.clone().with_centers(10),
            base.clone().with_population_size(14),
            base.clone().with_population_size(17),
            base.clone().with_mutation_rate(1.5),
            base.clone().with_mutation_rate(f64::NAN),
            base.clone().with_max_generations(0),
            base.clone().with_max_epochs(0),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(10), Err(KCenterError::InvalidParameters(_))),
                "expected rejection for {:?}",
                config
            );
        }

        // k must stay below the population size as well
        let big_k = RunConfig::default().with_centers(20).with_population_size(16);
        assert!(big_k.validate(100).is_err());
    }

    #[test]
    fn test_json_fills_missing_fields() {
        let config: RunConfig = serde_json::from_str(r#"{ "centers": 5, "seed": 9 }"#).unwrap();
        assert_eq!(config.centers, 5);
        assert_eq!(config.seed, 9);
        assert_eq!(config.population_size, 140);
    }
}
