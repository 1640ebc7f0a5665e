//! Exhaustive solver for small instances.
//!
//! Enumerates every `k`-subset of the nodes and keeps the one with the lowest
//! covering radius. Only practical for small `C(N, k)`; the solver refuses to
//! start above `max_combinations`.

use crate::error::{KCenterError, Result};
use crate::instance::DistanceOracle;
use crate::solution::Solution;
use itertools::Itertools;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ExhaustiveConfig {
    /// Upper bound on `C(N, k)`
    pub max_combinations: u64,
    /// Wall-clock limit in seconds; the best subset found so far is returned
    pub time_limit: f64,
}

impl Default for ExhaustiveConfig {
    fn default() -> Self {
        ExhaustiveConfig {
            max_combinations: 5_000_000,
            time_limit: 600.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExactResult {
    pub solution: Solution,
    /// False when the time limit cut the enumeration short
    pub optimal: bool,
    pub status: String,
    pub combinations_evaluated: u64,
}

pub struct ExhaustiveSolver {
    pub config: ExhaustiveConfig,
}

/// `C(n, k)`, saturating at `u64::MAX`
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

impl ExhaustiveSolver {
    pub fn new(config: ExhaustiveConfig) -> Self {
        ExhaustiveSolver { config }
    }

    /// Radius of `centers`, or `None` once it reaches `cutoff`
    fn bounded_radius(oracle: &dyn DistanceOracle, centers: &[usize], cutoff: f64) -> Result<Option<f64>> {
        let mut radius = 0.0f64;
        for node in 0..oracle.node_count() {
            let mut nearest = f64::INFINITY;
            for &c in centers {
                let d = if c == node {
                    0.0
                } else {
                    oracle
                        .distance(node, c)
                        .ok_or(KCenterError::MissingEdgeWeight { from: node, to: c })?
                };
                nearest = nearest.min(d);
            }
            radius = radius.max(nearest);
            if radius >= cutoff {
                return Ok(None);
            }
        }
        Ok(Some(radius))
    }

    pub fn solve(&self, oracle: &dyn DistanceOracle, k: usize) -> Result<ExactResult> {
        let start = Instant::now();
        let n = oracle.node_count();
        if k < 1 || k >= n {
            return Err(KCenterError::invalid(format!("centers ({}) must lie in 1..{}", k, n)));
        }

        let total = binomial(n, k);
        if total > self.config.max_combinations {
            return Err(KCenterError::invalid(format!(
                "C({}, {}) = {} combinations exceeds the limit of {}",
                n, k, total, self.config.max_combinations
            )));
        }
        log::info!("[Exact] Enumerating {} center sets (n={}, k={})", total, n, k);

        let mut best: Option<(Vec<usize>, f64)> = None;
        let mut evaluated = 0u64;
        let mut timed_out = false;

        for centers in (0..n).combinations(k) {
            if evaluated % 4096 == 0 && start.elapsed().as_secs_f64() > self.config.time_limit {
                timed_out = true;
                break;
            }
            evaluated += 1;

            let cutoff = best.as_ref().map_or(f64::INFINITY, |(_, s)| *s);
            if let Some(radius) = Self::bounded_radius(oracle, &centers, cutoff)? {
                best = Some((centers, radius));
            }
        }

        let (centers, _) = best.ok_or_else(|| KCenterError::invalid("time limit reached before any center set was scored"))?;
        let mut solution = Solution::from_centers(oracle, centers, "Exhaustive")?;
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(evaluated as usize);

        let status = if timed_out { "TIME_LIMIT" } else { "OPTIMAL" };
        log::info!(
            "[Exact] {} after {} sets: score {:.3}",
            status,
            evaluated,
            solution.score
        );

        Ok(ExactResult {
            solution,
            optimal: !timed_out,
            status: status.to_string(),
            combinations_evaluated: evaluated,
        })
    }
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self::new(ExhaustiveConfig::default())
    }
}
