//! Variation operators applied to a ranked population.
//!
//! Crossover pairs the best half, writes two children per pair into the worst
//! half (mirrored from the end) and re-randomizes the ranks between the elite band
//! and the offspring band. Mutation flips random genes anywhere in the
//! population, elites included.

use crate::chromosome::Chromosome;
use crate::config::ELITE_COUNT;
use crate::error::{KCenterError, Result};
use crate::heuristics::fitness::Individual;
use rand::prelude::*;

/// Two-point segment exchange.
///
/// Child A is `a` with positions `point1..=point2` taken from `b`; child B is the
/// complementary swap.
///
/// ```text
///    Parent A: AAAAAAAAAAAAAAAA                    Child A: AAABBBBAAAAAAAAA
///                 ^--^              results in
///    Parent B: BBBBBBBBBBBBBBBB                    Child B: BBBAAAABBBBBBBBB
/// ```
pub fn segment_swap(
    a: &Chromosome,
    b: &Chromosome,
    point1: usize,
    point2: usize,
) -> (Chromosome, Chromosome) {
    let mut child_a = a.clone();
    child_a.copy_segment(b, point1, point2);
    let mut child_b = b.clone();
    child_b.copy_segment(a, point1, point2);
    (child_a, child_b)
}

/// Crossover step on a population sorted best first.
///
/// After the call, ranks `0..8` are untouched, ranks `8..half` hold fresh random
/// chromosomes with `k` centers and ranks `half..` hold the offspring of the
/// best half. Offspring scores are reset; they need repair before scoring.
///
/// When `half` is odd the last pair is rank `half - 1` with rank `half`: child A
/// takes slot `half` and child B is discarded with the random band.
pub fn crossover<R: Rng + ?Sized>(population: &mut [Individual], k: usize, rng: &mut R) -> Result<()> {
    let size = population.len();
    if size < 2 * ELITE_COUNT || size % 2 != 0 {
        return Err(KCenterError::invalid(format!(
            "crossover needs an even population of at least {}, got {}",
            2 * ELITE_COUNT,
            size
        )));
    }
    let n = population[0].chromosome.len();
    let half = size / 2;

    let (parents, offspring) = population.split_at_mut(half);
    for i in (0..half).step_by(2) {
        let mut point1 = rng.gen_range(0..n);
        let mut point2 = rng.gen_range(0..n);
        if point1 > point2 {
            std::mem::swap(&mut point1, &mut point2);
        }

        if i + 1 < half {
            let (child_a, child_b) =
                segment_swap(&parents[i].chromosome, &parents[i + 1].chromosome, point1, point2);
            // slots size-1-i and size-2-i, relative to the start of the second half
            offspring[half - 1 - i] = Individual::new(child_a);
            offspring[half - 2 - i] = Individual::new(child_b);
        } else {
            // odd half: the last rank of the best half pairs with rank `half`,
            // which is still unwritten at this point
            let (child_a, child_b) =
                segment_swap(&parents[i].chromosome, &offspring[0].chromosome, point1, point2);
            offspring[0] = Individual::new(child_a);
            // lands in the random band and is overwritten below
            parents[half - 1] = Individual::new(child_b);
        }
    }

    for individual in &mut parents[ELITE_COUNT..] {
        *individual = Individual::new(Chromosome::random(n, k, rng)?);
    }

    Ok(())
}

/// Flip `count` randomly chosen genes across the whole population.
///
/// Events are independent: the same slot or gene can be hit more than once.
pub fn mutate<R: Rng + ?Sized>(population: &mut [Individual], count: usize, rng: &mut R) {
    if population.is_empty() {
        return;
    }
    let n = population[0].chromosome.len();
    for _ in 0..count {
        let slot = rng.gen_range(0..population.len());
        let gene = rng.gen_range(0..n);
        population[slot].chromosome.flip(gene);
    }
}
