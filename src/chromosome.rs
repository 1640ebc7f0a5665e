//! Bit-vector encoding of a candidate center set.
//!
//! Gene `j` is set when node `j` is a center. Crossover and mutation do not keep
//! the number of set genes at `k`; the repair step in
//! [`crate::heuristics::fitness`] restores it before every evaluation.

use crate::error::{KCenterError, Result};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-length bit vector over the nodes of an instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    genes: Vec<bool>,
}

impl Chromosome {
    /// All-zero chromosome over `len` nodes
    pub fn new(len: usize) -> Self {
        Chromosome {
            genes: vec![false; len],
        }
    }

    /// Chromosome with exactly `k` distinct genes set, drawn uniformly without replacement.
    pub fn random<R: Rng + ?Sized>(len: usize, k: usize, rng: &mut R) -> Result<Self> {
        if k < 1 || k >= len {
            return Err(KCenterError::invalid(format!(
                "cannot place {} centers among {} nodes",
                k, len
            )));
        }
        let mut chromosome = Self::new(len);
        for pos in index::sample(rng, len, k) {
            chromosome.genes[pos] = true;
        }
        Ok(chromosome)
    }

    /// Chromosome whose set genes are exactly `centers`
    pub fn from_centers(len: usize, centers: &[usize]) -> Result<Self> {
        let mut chromosome = Self::new(len);
        for &c in centers {
            if c >= len {
                return Err(KCenterError::invalid(format!(
                    "center {} outside 0..{}",
                    c, len
                )));
            }
            chromosome.genes[c] = true;
        }
        Ok(chromosome)
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[bool] {
        &self.genes
    }

    #[inline]
    pub fn is_center(&self, node: usize) -> bool {
        self.genes[node]
    }

    #[inline]
    pub fn set(&mut self, node: usize, value: bool) {
        self.genes[node] = value;
    }

    /// Flip gene `node` (0 becomes 1 and vice versa)
    #[inline]
    pub fn flip(&mut self, node: usize) {
        self.genes[node] = !self.genes[node];
    }

    /// Number of set genes
    pub fn count_centers(&self) -> usize {
        self.genes.iter().filter(|&&g| g).count()
    }

    /// Ascending list of center node indices
    pub fn centers(&self) -> Vec<usize> {
        self.genes
            .iter()
            .enumerate()
            .filter(|(_, &g)| g)
            .map(|(i, _)| i)
            .collect()
    }

    /// Overwrite positions `start..=end` with the genes of `other`
    pub fn copy_segment(&mut self, other: &Chromosome, start: usize, end: usize) {
        self.genes[start..=end].copy_from_slice(&other.genes[start..=end]);
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &g in &self.genes {
            f.write_str(if g { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Chromosome {
    type Err = KCenterError;

    /// Parse a string of `0`/`1` characters
    fn from_str(s: &str) -> Result<Self> {
        let genes = s
            .chars()
            .enumerate()
            .map(|(i, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(KCenterError::parse(
                    0,
                    format!("invalid gene '{}' at position {}", other, i),
                )),
            })
            .collect::<Result<Vec<bool>>>()?;
        Ok(Chromosome { genes })
    }
}

/// Create `population_size` chromosomes, each with exactly `k` centers among `n` nodes.
pub fn initialize_population<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    population_size: usize,
    rng: &mut R,
) -> Result<Vec<Chromosome>> {
    (0..population_size)
        .map(|_| Chromosome::random(n, k, rng))
        .collect()
}
