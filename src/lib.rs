//! k-Center GA Library
//!
//! A genetic algorithm for the metric k-center problem: choose `k` nodes of a
//! weighted graph so that the largest distance from any node to its nearest
//! chosen node is as small as possible.
//!
//! # Features
//!
//! - Bit-vector chromosomes with repair to exactly `k` centers
//! - Elitist two-point crossover and random gene-flip mutation
//! - Deterministic parallel fitness evaluation on rayon
//! - Stagnation and generation-cap termination, external cancellation
//! - Farthest-first baseline and exhaustive solver for small instances
//! - TSPLIB-style instance loading, benchmarking and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use kcenter_ga::config::RunConfig;
//! use kcenter_ga::heuristics::genetic::GeneticAlgorithm;
//! use kcenter_ga::instance::KCenterInstance;
//!
//! // Load instance
//! let instance = KCenterInstance::from_file("instance.tsp").unwrap();
//!
//! // Search for 5 centers
//! let config = RunConfig::default().with_centers(5).with_seed(1);
//! let mut ga = GeneticAlgorithm::new(&instance, config).unwrap();
//! let result = ga.run().unwrap();
//!
//! println!("Score: {:.2} with centers {:?}", result.best_score, result.best_centers);
//! ```

pub mod benchmark;
pub mod chromosome;
pub mod config;
pub mod error;
pub mod exact;
pub mod heuristics;
pub mod instance;
pub mod solution;
pub mod visualization;

pub use config::RunConfig;
pub use error::{KCenterError, Result};
pub use instance::{DistanceOracle, KCenterInstance};
pub use solution::Solution;
