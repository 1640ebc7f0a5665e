use crate::error::{KCenterError, Result};
use crate::instance::DistanceOracle;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub trait ConstructionHeuristic {
    fn construct(&self, oracle: &dyn DistanceOracle) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Farthest-First Traversal (Gonzalez)
///
/// Starts from a random node and repeatedly opens the node farthest from the
/// centers chosen so far. On metric instances the result is within a factor 2
/// of the optimum.
pub struct FarthestFirstHeuristic {
    pub k: usize,
    pub seed: u64,
    /// Number of random start nodes tried; the best result is kept
    pub starts: usize,
}

impl FarthestFirstHeuristic {
    pub fn new(k: usize) -> Self {
        FarthestFirstHeuristic { k, seed: 42, starts: 1 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn multi_start(mut self, starts: usize) -> Self {
        self.starts = starts.max(1);
        self
    }

    fn distance(oracle: &dyn DistanceOracle, from: usize, to: usize) -> Result<f64> {
        if from == to {
            return Ok(0.0);
        }
        oracle
            .distance(from, to)
            .ok_or(KCenterError::MissingEdgeWeight { from, to })
    }

    /// Center set grown from `first`
    fn traverse(&self, oracle: &dyn DistanceOracle, first: usize) -> Result<Vec<usize>> {
        let n = oracle.node_count();
        let mut centers = vec![first];
        let mut is_center = vec![false; n];
        is_center[first] = true;
        let mut nearest: Vec<f64> = (0..n)
            .map(|node| Self::distance(oracle, node, first))
            .collect::<Result<_>>()?;

        while centers.len() < self.k {
            // ties go to the lowest index
            let next = (0..n)
                .filter(|&node| !is_center[node])
                .max_by_key(|&node| (OrderedFloat(nearest[node]), std::cmp::Reverse(node)))
                .ok_or_else(|| KCenterError::invalid("no node left to open"))?;
            centers.push(next);
            is_center[next] = true;

            for node in 0..n {
                let d = Self::distance(oracle, node, next)?;
                if d < nearest[node] {
                    nearest[node] = d;
                }
            }
        }

        Ok(centers)
    }
}

impl ConstructionHeuristic for FarthestFirstHeuristic {
    fn construct(&self, oracle: &dyn DistanceOracle) -> Result<Solution> {
        let start = std::time::Instant::now();
        let n = oracle.node_count();
        if self.k < 1 || self.k >= n {
            return Err(KCenterError::invalid(format!(
                "centers ({}) must lie in 1..{}",
                self.k, n
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut best: Option<Solution> = None;

        for _ in 0..self.starts {
            let first = rng.gen_range(0..n);
            let centers = self.traverse(oracle, first)?;
            let solution = Solution::from_centers(oracle, centers, self.name())?;
            log::debug!(
                "[FarthestFirst] start {} -> score {:.3}",
                first,
                solution.score
            );
            if best.as_ref().map_or(true, |b| solution.score < b.score) {
                best = Some(solution);
            }
        }

        let mut solution = best.ok_or_else(|| KCenterError::invalid("no start node tried"))?;
        solution.iterations = Some(self.starts);
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        if self.starts > 1 {
            "FarthestFirst-MultiStart"
        } else {
            "FarthestFirst"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::KCenterInstance;

    fn create_test_instance() -> KCenterInstance {
        // two groups far apart
        KCenterInstance::from_coordinates(
            "groups",
            &[
                (0.0, 0.0),
                (1.0, 0.0),
                (0.0, 1.0),
                (100.0, 100.0),
                (101.0, 100.0),
                (100.0, 101.0),
            ],
        )
    }

    #[test]
    fn test_farthest_first_separates_groups() {
        let instance = create_test_instance();
        let solution = FarthestFirstHeuristic::new(2).construct(&instance).unwrap();

        assert_eq!(solution.centers.len(), 2);
        let low = solution.centers.iter().filter(|&&c| c < 3).count();
        assert_eq!(low, 1);
        assert!(solution.score <= 2.0f64.sqrt() + 1e-9);
    }

    #[test]
    fn test_multi_start_is_no_worse() {
        let instance = create_test_instance();
        let single = FarthestFirstHeuristic::new(3).with_seed(5).construct(&instance).unwrap();
        let multi = FarthestFirstHeuristic::new(3)
            .with_seed(5)
            .multi_start(6)
            .construct(&instance)
            .unwrap();

        assert!(multi.score <= single.score);
        assert_eq!(multi.iterations, Some(6));
    }

    #[test]
    fn test_rejects_k_equal_to_n() {
        let instance = create_test_instance();
        assert!(FarthestFirstHeuristic::new(6).construct(&instance).is_err());
    }
}
