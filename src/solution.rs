//! Solution representation for the k-center problem.
//!
//! A [`Solution`] is algorithm-neutral: the genetic search, the farthest-first
//! heuristic and the exhaustive solver all report through it.

use crate::error::{KCenterError, Result};
use crate::heuristics::fitness::{evaluate_centers, nearest_center};
use crate::heuristics::genetic::{SearchResult, StopReason};
use crate::instance::DistanceOracle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Represents a solution to the k-center problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Chosen center nodes, ascending
    pub centers: Vec<usize>,
    /// Largest distance from any node to its nearest center
    pub score: f64,
    /// Nearest center of every node
    pub assignment: Vec<usize>,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (generations for the genetic search)
    pub iterations: Option<usize>,
    pub stop_reason: Option<StopReason>,
    pub timestamp: DateTime<Utc>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            centers: Vec::new(),
            score: f64::INFINITY,
            assignment: Vec::new(),
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
            stop_reason: None,
            timestamp: Utc::now(),
        }
    }

    /// Score `centers` and assign every node to its nearest one.
    pub fn from_centers<G: DistanceOracle + ?Sized>(
        oracle: &G,
        mut centers: Vec<usize>,
        algorithm: &str,
    ) -> Result<Self> {
        centers.sort_unstable();
        centers.dedup();
        let score = evaluate_centers(oracle, &centers)?;
        let assignment = assign(oracle, &centers)?;

        Ok(Solution {
            centers,
            score,
            assignment,
            algorithm: algorithm.to_string(),
            ..Solution::new()
        })
    }

    /// Solution for the final center set of a genetic search
    pub fn from_search<G: DistanceOracle + ?Sized>(oracle: &G, result: &SearchResult) -> Result<Self> {
        let mut solution = Self::from_centers(oracle, result.best_centers.clone(), "GeneticAlgorithm")?;
        solution.computation_time = result.computation_time;
        solution.iterations = Some(result.generations);
        solution.stop_reason = Some(result.stop_reason);
        Ok(solution)
    }

    /// Recompute score and assignment, failing if the center set is not usable
    pub fn validate<G: DistanceOracle + ?Sized>(&mut self, oracle: &G) -> Result<()> {
        let n = oracle.node_count();
        let unique: HashSet<usize> = self.centers.iter().cloned().collect();
        if unique.len() != self.centers.len() {
            return Err(KCenterError::invalid("duplicate centers in solution"));
        }
        if self.centers.is_empty() || self.centers.len() >= n {
            return Err(KCenterError::invalid(format!(
                "solution has {} centers for {} nodes",
                self.centers.len(),
                n
            )));
        }
        self.score = evaluate_centers(oracle, &self.centers)?;
        self.assignment = assign(oracle, &self.centers)?;
        Ok(())
    }

    pub fn k(&self) -> usize {
        self.centers.len()
    }

    /// Nodes served by `center`
    pub fn cluster(&self, center: usize) -> Vec<usize> {
        self.assignment
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == center)
            .map(|(node, _)| node)
            .collect()
    }

    /// Relative gap to a reference score, in percent
    pub fn gap_to(&self, reference: f64) -> f64 {
        gap_percent(self.score, reference)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Score: {:.3}", self.score)?;
        writeln!(f, "  Centers ({}): {:?}", self.centers.len(), self.centers)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        if let Some(reason) = self.stop_reason {
            writeln!(f, "  Stopped: {}", reason)?;
        }
        write!(f, "  Timestamp: {}", self.timestamp.to_rfc3339())
    }
}

fn assign<G: DistanceOracle + ?Sized>(oracle: &G, centers: &[usize]) -> Result<Vec<usize>> {
    (0..oracle.node_count())
        .map(|node| nearest_center(oracle, node, centers).map(|(c, _)| c))
        .collect()
}

/// Gap of `score` above `reference`, in percent.
///
/// A zero reference gives 0 for a matching score and infinity otherwise.
pub fn gap_percent(score: f64, reference: f64) -> f64 {
    if reference > 0.0 {
        (score - reference) / reference * 100.0
    } else if score == reference {
        0.0
    } else {
        f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::KCenterInstance;

    fn square() -> KCenterInstance {
        KCenterInstance::from_coordinates(
            "square",
            &[(0.0, 0.0), (3.0, 0.0), (0.0, 4.0), (3.0, 4.0), (1.0, 0.0)],
        )
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.centers.is_empty());
        assert_eq!(sol.score, f64::INFINITY);
    }

    #[test]
    fn test_from_centers_assigns_nearest() {
        let instance = square();
        let sol = Solution::from_centers(&instance, vec![3, 0], "manual").unwrap();

        assert_eq!(sol.centers, vec![0, 3]);
        assert_eq!(sol.assignment, vec![0, 3, 0, 3, 0]);
        // node 1 is 3 from node 0 and 4 from node 3
        assert!((sol.score - 4.0).abs() < 1e-10);
        assert_eq!(sol.cluster(0), vec![0, 2, 4]);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let instance = square();
        let mut sol = Solution::new();
        sol.centers = vec![1, 1];
        assert!(sol.validate(&instance).is_err());

        sol.centers = vec![1, 2];
        sol.validate(&instance).unwrap();
        assert_eq!(sol.assignment.len(), 5);
    }

    #[test]
    fn test_gap() {
        let mut sol = Solution::new();
        sol.score = 12.0;
        assert!((sol.gap_to(10.0) - 20.0).abs() < 1e-10);
        sol.score = 0.0;
        assert_eq!(sol.gap_to(0.0), 0.0);
    }

    #[test]
    fn test_json_output() {
        let instance = square();
        let sol = Solution::from_centers(&instance, vec![0, 3], "manual").unwrap();
        let json = sol.to_json().unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.centers, sol.centers);
        assert_eq!(back.algorithm, "manual");
    }
}
