//! Repair and fitness evaluation.
//!
//! A chromosome leaving crossover or mutation may hold any number of centers.
//! [`repair`] brings it back to exactly `k` by random removals or additions, and
//! [`evaluate`] scores it with the k-center objective: the largest distance from
//! any node to its nearest center. Lower is better.

use crate::chromosome::Chromosome;
use crate::error::{KCenterError, Result};
use crate::instance::DistanceOracle;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Chromosome paired with its last computed score
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub chromosome: Chromosome,
    /// k-center objective, `f64::INFINITY` until evaluated
    pub score: f64,
}

impl Individual {
    pub fn new(chromosome: Chromosome) -> Self {
        Individual {
            chromosome,
            score: f64::INFINITY,
        }
    }

    /// Repair the chromosome in place, then recompute its score.
    pub fn repair_and_evaluate<G, R>(&mut self, oracle: &G, k: usize, rng: &mut R) -> Result<()>
    where
        G: DistanceOracle + ?Sized,
        R: Rng + ?Sized,
    {
        repair(&mut self.chromosome, k, rng)?;
        self.score = evaluate(oracle, &self.chromosome)?;
        Ok(())
    }
}

/// Restore the "exactly `k` centers" invariant.
///
/// Surplus centers are removed by drawing a position in the current center list;
/// missing centers are added by rejection sampling over the non-center nodes.
/// The result only depends on the input chromosome and the state of `rng`.
pub fn repair<R: Rng + ?Sized>(chromosome: &mut Chromosome, k: usize, rng: &mut R) -> Result<()> {
    let n = chromosome.len();
    if k < 1 || k >= n {
        return Err(KCenterError::invalid(format!(
            "cannot repair to {} centers over {} nodes",
            k, n
        )));
    }

    let mut centers = chromosome.centers();
    while centers.len() != k {
        if centers.len() > k {
            let pos = rng.gen_range(0..centers.len());
            let node = centers.remove(pos);
            chromosome.set(node, false);
            log::trace!("repair: removed center {}", node);
        } else {
            let mut node = rng.gen_range(0..n);
            while chromosome.is_center(node) {
                node = rng.gen_range(0..n);
            }
            centers.push(node);
            chromosome.set(node, true);
            log::trace!("repair: added center {}", node);
        }
    }

    Ok(())
}

/// Score a chromosome; it is expected to hold at least one center.
pub fn evaluate<G: DistanceOracle + ?Sized>(oracle: &G, chromosome: &Chromosome) -> Result<f64> {
    let centers = chromosome.centers();
    if centers.is_empty() {
        return Err(KCenterError::invalid("cannot score a chromosome without centers"));
    }
    covering_radius(oracle, &centers, chromosome.genes())
}

/// Score an explicit center list.
pub fn evaluate_centers<G: DistanceOracle + ?Sized>(oracle: &G, centers: &[usize]) -> Result<f64> {
    let n = oracle.node_count();
    if centers.is_empty() {
        return Err(KCenterError::invalid("cannot score an empty center set"));
    }
    let mut is_center = vec![false; n];
    for &c in centers {
        if c >= n {
            return Err(KCenterError::invalid(format!("center {} outside 0..{}", c, n)));
        }
        is_center[c] = true;
    }
    covering_radius(oracle, centers, &is_center)
}

/// Nearest center of `node` and the distance to it. Ties keep the first center listed.
pub fn nearest_center<G: DistanceOracle + ?Sized>(
    oracle: &G,
    node: usize,
    centers: &[usize],
) -> Result<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for &c in centers {
        let d = if c == node {
            0.0
        } else {
            oracle
                .distance(node, c)
                .ok_or(KCenterError::MissingEdgeWeight { from: node, to: c })?
        };
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((c, d));
        }
    }
    best.ok_or_else(|| KCenterError::invalid("cannot assign a node without centers"))
}

fn covering_radius<G: DistanceOracle + ?Sized>(
    oracle: &G,
    centers: &[usize],
    is_center: &[bool],
) -> Result<f64> {
    let mut score = 0.0f64;

    for node in 0..oracle.node_count() {
        // centers cover themselves at distance 0
        if is_center[node] {
            continue;
        }
        let mut nearest = f64::INFINITY;
        for &c in centers {
            let d = oracle
                .distance(node, c)
                .ok_or(KCenterError::MissingEdgeWeight { from: node, to: c })?;
            if d < nearest {
                nearest = d;
            }
        }
        score = score.max(nearest);
    }

    Ok(score)
}

/// Repair and score every individual.
///
/// One seed per individual is drawn from `rng` up front, so the outcome is the
/// same whether the pass runs sequentially or on the rayon pool.
pub fn evaluate_population<G, R>(
    oracle: &G,
    population: &mut [Individual],
    k: usize,
    rng: &mut R,
    parallel: bool,
) -> Result<()>
where
    G: DistanceOracle + ?Sized,
    R: Rng + ?Sized,
{
    let seeds: Vec<u64> = (0..population.len()).map(|_| rng.gen()).collect();

    if parallel {
        population
            .par_iter_mut()
            .zip(seeds.par_iter())
            .try_for_each(|(individual, &seed)| {
                let mut local = ChaCha8Rng::seed_from_u64(seed);
                individual.repair_and_evaluate(oracle, k, &mut local)
            })
    } else {
        for (individual, &seed) in population.iter_mut().zip(seeds.iter()) {
            let mut local = ChaCha8Rng::seed_from_u64(seed);
            individual.repair_and_evaluate(oracle, k, &mut local)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::KCenterInstance;

    fn line_instance() -> KCenterInstance {
        // nodes on a line at 0, 1, 2, 10, 11
        KCenterInstance::from_coordinates(
            "line",
            &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (10.0, 0.0), (11.0, 0.0)],
        )
    }

    #[test]
    fn test_evaluate_known_score() {
        let instance = line_instance();
        let c: Chromosome = "01010".parse().unwrap();
        // node 0 -> 1, node 2 -> 1, node 4 -> 3
        assert!((evaluate(&instance, &c).unwrap() - 1.0).abs() < 1e-10);

        let c: Chromosome = "10000".parse().unwrap();
        assert!((evaluate(&instance, &c).unwrap() - 11.0).abs() < 1e-10);
    }

    #[test]
    fn test_score_is_zero_when_every_node_is_covered_at_distance_zero() {
        let instance = KCenterInstance::from_matrix(
            "twins",
            vec![
                vec![0.0, 0.0, 5.0],
                vec![0.0, 0.0, 5.0],
                vec![5.0, 5.0, 0.0],
            ],
        )
        .unwrap();
        let c: Chromosome = "101".parse().unwrap();
        assert_eq!(evaluate(&instance, &c).unwrap(), 0.0);
    }

    #[test]
    fn test_repair_removes_surplus() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c: Chromosome = "11111".parse().unwrap();
        repair(&mut c, 2, &mut rng).unwrap();
        assert_eq!(c.count_centers(), 2);
    }

    #[test]
    fn test_repair_adds_missing() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c: Chromosome = "00000000".parse().unwrap();
        repair(&mut c, 3, &mut rng).unwrap();
        assert_eq!(c.count_centers(), 3);

        let mut keep: Chromosome = "01000000".parse().unwrap();
        repair(&mut keep, 3, &mut rng).unwrap();
        assert!(keep.is_center(1), "existing centers are kept when adding");
    }

    #[test]
    fn test_repair_leaves_valid_chromosome_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c: Chromosome = "00101".parse().unwrap();
        repair(&mut c, 2, &mut rng).unwrap();
        assert_eq!(c.to_string(), "00101");
    }

    #[test]
    fn test_repair_rejects_k_equal_to_n() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut c: Chromosome = "000".parse().unwrap();
        assert!(matches!(
            repair(&mut c, 3, &mut rng),
            Err(KCenterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_missing_edge_weight() {
        let instance = KCenterInstance::from_edges("sparse", 3, &[(0, 1, 1.0)]).unwrap();
        let c: Chromosome = "100".parse().unwrap();
        match evaluate(&instance, &c) {
            Err(KCenterError::MissingEdgeWeight { from, to }) => assert_eq!((from, to), (2, 0)),
            other => panic!("expected MissingEdgeWeight, got {:?}", other),
        }
    }

    #[test]
    fn test_nearest_center() {
        let instance = line_instance();
        assert_eq!(nearest_center(&instance, 4, &[0, 3]).unwrap(), (3, 1.0));
        assert_eq!(nearest_center(&instance, 3, &[0, 3]).unwrap(), (3, 0.0));
    }

    #[test]
    fn test_parallel_and_sequential_passes_agree() {
        let instance = line_instance();
        let make = || {
            vec![
                Individual::new("11111".parse().unwrap()),
                Individual::new("00000".parse().unwrap()),
                Individual::new("10010".parse().unwrap()),
                Individual::new("01000".parse().unwrap()),
            ]
        };

        let mut seq = make();
        let mut par = make();
        evaluate_population(&instance, &mut seq, 2, &mut ChaCha8Rng::seed_from_u64(11), false).unwrap();
        evaluate_population(&instance, &mut par, 2, &mut ChaCha8Rng::seed_from_u64(11), true).unwrap();

        assert_eq!(seq, par);
        assert!(seq.iter().all(|ind| ind.chromosome.count_centers() == 2));
        assert!(seq.iter().all(|ind| ind.score.is_finite() && ind.score >= 0.0));
    }
}
