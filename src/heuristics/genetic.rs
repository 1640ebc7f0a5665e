//! Genetic Algorithm for the k-center problem.
//!
//! Each generation runs the pipeline
//! repair & fitness -> ranking -> report -> crossover -> mutation
//! on a population owned by [`GeneticAlgorithm`]. The search stops after
//! `max_generations` generations, when the best score has not changed for
//! `max_epochs` consecutive generations, or when an external stop flag is raised.

use crate::chromosome::{initialize_population, Chromosome};
use crate::config::RunConfig;
use crate::error::{KCenterError, Result};
use crate::heuristics::fitness::{evaluate_population, Individual};
use crate::heuristics::operators::{crossover, mutate};
use crate::instance::DistanceOracle;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The generation budget was used up
    MaxGenerationsReached,
    /// The best score stayed the same for `max_epochs` generations
    Stagnation,
    /// The stop flag was raised between two generations
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::MaxGenerationsReached => "max generations reached",
            StopReason::Stagnation => "stagnation",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Snapshot of one generation, taken right after ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub best_score: f64,
    pub best_centers: Vec<usize>,
    pub center_count: usize,
}

impl GenerationReport {
    fn new(generation: usize, best: &Individual) -> Self {
        let best_centers = best.chromosome.centers();
        GenerationReport {
            generation,
            best_score: best.score,
            center_count: best_centers.len(),
            best_centers,
        }
    }
}

/// Receives one report per completed generation
pub trait ProgressObserver {
    fn on_generation(&mut self, report: &GenerationReport);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&GenerationReport),
{
    fn on_generation(&mut self, report: &GenerationReport) {
        self(report)
    }
}

/// Writes every report to the `debug` log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_generation(&mut self, report: &GenerationReport) {
        log::debug!(
            "[GA] Generation {}  Cost {:.3}  Centers {}  Best solution {:?}",
            report.generation,
            report.best_score,
            report.center_count,
            report.best_centers
        );
    }
}

/// Keeps every report
#[derive(Debug, Clone, Default)]
pub struct History {
    pub reports: Vec<GenerationReport>,
}

impl ProgressObserver for History {
    fn on_generation(&mut self, report: &GenerationReport) {
        self.reports.push(report.clone());
    }
}

/// Loop state of a single run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Index of the next generation to run
    pub generation: usize,
    /// Best score of the previous generation, `None` before the first one
    pub best_score_prev: Option<f64>,
    /// Consecutive generations sharing the same best score
    pub stagnation_count: usize,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the current generation with its best score.
    ///
    /// Returns the updated stagnation count. The first generation always
    /// starts the count at 1.
    pub fn record(&mut self, best_score: f64) -> usize {
        if self.best_score_prev == Some(best_score) {
            self.stagnation_count += 1;
        } else {
            self.stagnation_count = 1;
        }
        self.best_score_prev = Some(best_score);
        self.generation += 1;
        self.stagnation_count
    }
}

/// Outcome of [`GeneticAlgorithm::run`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub stop_reason: StopReason,
    /// Index of the last completed generation
    pub final_generation: usize,
    /// Number of completed generations
    pub generations: usize,
    /// Best score of the last completed generation
    pub best_score: f64,
    pub best_centers: Vec<usize>,
    pub best_chromosome: Chromosome,
    /// Lowest score seen in any generation; mutation may have destroyed it since
    pub best_ever_score: f64,
    pub best_ever_centers: Vec<usize>,
    /// Best score of every generation, in order
    pub score_history: Vec<f64>,
    /// Wall-clock time in seconds
    pub computation_time: f64,
}

/// Sort ascending by score. The sort is stable, so ties keep their order.
pub fn rank(population: &mut [Individual]) {
    population.sort_by_key(|ind| OrderedFloat(ind.score));
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<'a, G: DistanceOracle + ?Sized> {
    oracle: &'a G,
    config: RunConfig,
    population: Vec<Individual>,
    rng: ChaCha8Rng,
    state: SearchState,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, G: DistanceOracle + ?Sized> GeneticAlgorithm<'a, G> {
    /// Validate `config` against the oracle and prepare a search.
    pub fn new(oracle: &'a G, config: RunConfig) -> Result<Self> {
        config.validate(oracle.node_count())?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(GeneticAlgorithm {
            oracle,
            config,
            population: Vec::new(),
            rng,
            state: SearchState::new(),
            cancel: None,
        })
    }

    /// Stop between generations once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Get current loop state
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Population as left by the last generation (after crossover and mutation)
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Average Hamming distance between the first 20 chromosomes
    pub fn population_diversity(&self) -> f64 {
        let sample = &self.population[..self.population.len().min(20)];
        let mut total_diff = 0usize;
        let mut count = 0usize;

        for i in 0..sample.len() {
            for j in i + 1..sample.len() {
                total_diff += sample[i]
                    .chromosome
                    .genes()
                    .iter()
                    .zip(sample[j].chromosome.genes())
                    .filter(|(a, b)| a != b)
                    .count();
                count += 1;
            }
        }

        if count > 0 {
            total_diff as f64 / count as f64
        } else {
            0.0
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Run the genetic algorithm, reporting progress to the debug log
    pub fn run(&mut self) -> Result<SearchResult> {
        self.run_with_observer(&mut LogObserver)
    }

    /// Run the genetic algorithm, handing every generation report to `observer`
    pub fn run_with_observer<O>(&mut self, observer: &mut O) -> Result<SearchResult>
    where
        O: ProgressObserver + ?Sized,
    {
        let start = Instant::now();
        let n = self.oracle.node_count();
        let k = self.config.centers;

        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.state = SearchState::new();
        self.population = initialize_population(n, k, self.config.population_size, &mut self.rng)?
            .into_iter()
            .map(Individual::new)
            .collect();

        log::info!(
            "[GA] Starting: nodes={} k={} population={} mutation_rate={} max_generations={} max_epochs={} seed={}",
            n,
            k,
            self.config.population_size,
            self.config.mutation_rate,
            self.config.max_generations,
            self.config.max_epochs,
            self.config.seed
        );

        let mut score_history = Vec::with_capacity(self.config.max_generations);
        let mut current: Option<Individual> = None;
        let mut best_ever: Option<Individual> = None;

        let stop_reason = loop {
            if self.state.generation >= self.config.max_generations {
                break StopReason::MaxGenerationsReached;
            }
            if self.state.generation > 0 && self.is_cancelled() {
                break StopReason::Cancelled;
            }

            evaluate_population(
                self.oracle,
                &mut self.population,
                k,
                &mut self.rng,
                self.config.parallel,
            )?;
            rank(&mut self.population);

            let best = self.population[0].clone();
            score_history.push(best.score);
            observer.on_generation(&GenerationReport::new(self.state.generation, &best));
            log::trace!(
                "[GA] Generation {} diversity {:.2}",
                self.state.generation,
                self.population_diversity()
            );

            if best_ever.as_ref().map_or(true, |b| best.score < b.score) {
                best_ever = Some(best.clone());
            }

            crossover(&mut self.population, k, &mut self.rng)?;
            mutate(&mut self.population, self.config.mutation_count(), &mut self.rng);

            let stagnation = self.state.record(best.score);
            current = Some(best);
            if stagnation >= self.config.max_epochs {
                break StopReason::Stagnation;
            }
        };

        let best = current.ok_or_else(|| KCenterError::invalid("no generation was completed"))?;
        let best_ever = best_ever.unwrap_or_else(|| best.clone());
        let generations = self.state.generation;

        log::info!(
            "[GA] Stopped ({}) after {} generations: best score {:.3}, best ever {:.3}, {:.2}s",
            stop_reason,
            generations,
            best.score,
            best_ever.score,
            start.elapsed().as_secs_f64()
        );

        Ok(SearchResult {
            stop_reason,
            final_generation: generations - 1,
            generations,
            best_score: best.score,
            best_centers: best.chromosome.centers(),
            best_chromosome: best.chromosome,
            best_ever_score: best_ever.score,
            best_ever_centers: best_ever.chromosome.centers(),
            score_history,
            computation_time: start.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::KCenterInstance;

    fn create_test_instance() -> KCenterInstance {
        // three well separated clusters of four points
        let mut points = Vec::new();
        for &(cx, cy) in &[(0.0, 0.0), (50.0, 0.0), (25.0, 40.0)] {
            for &(dx, dy) in &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
                points.push((cx + dx, cy + dy));
            }
        }
        KCenterInstance::from_coordinates("clusters", &points)
    }

    fn small_config() -> RunConfig {
        RunConfig::default()
            .with_centers(3)
            .with_population_size(16)
            .with_mutation_rate(0.2)
            .with_max_generations(40)
            .with_max_epochs(10)
            .with_seed(7)
            .with_parallel(false)
    }

    #[test]
    fn test_rank_is_ascending_and_stable() {
        let mut population: Vec<Individual> = [3.0, 1.0, 2.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let mut ind = Individual::new(Chromosome::from_centers(4, &[i]).unwrap());
                ind.score = s;
                ind
            })
            .collect();
        rank(&mut population);

        let scores: Vec<f64> = population.iter().map(|i| i.score).collect();
        assert_eq!(scores, vec![1.0, 1.0, 2.0, 3.0]);
        assert_eq!(population[0].chromosome.centers(), vec![1]);
        assert_eq!(population[1].chromosome.centers(), vec![3]);
    }

    #[test]
    fn test_search_state_counts_stagnation() {
        let mut state = SearchState::new();
        assert_eq!(state.record(5.0), 1);
        assert_eq!(state.record(5.0), 2);
        assert_eq!(state.record(4.0), 1);
        assert_eq!(state.record(4.0), 2);
        assert_eq!(state.record(4.0), 3);
        assert_eq!(state.generation, 5);
        assert_eq!(state.best_score_prev, Some(4.0));
    }

    #[test]
    fn test_first_generation_starts_count_even_for_zero_score() {
        let mut state = SearchState::new();
        assert_eq!(state.record(0.0), 1);
    }

    #[test]
    fn test_genetic_algorithm() {
        let instance = create_test_instance();
        let mut ga = GeneticAlgorithm::new(&instance, small_config()).unwrap();
        let result = ga.run().unwrap();

        assert_eq!(result.best_centers.len(), 3);
        assert!(result.generations <= 40);
        assert_eq!(result.score_history.len(), result.generations);
        assert_eq!(result.final_generation + 1, result.generations);
        assert!(result.best_ever_score <= result.best_score);
        assert!(result.best_score >= 0.0);
    }

    #[test]
    fn test_reports_have_k_centers() {
        let instance = create_test_instance();
        let mut history = History::default();
        let mut ga = GeneticAlgorithm::new(&instance, small_config()).unwrap();
        ga.run_with_observer(&mut history).unwrap();

        assert!(!history.reports.is_empty());
        for (i, report) in history.reports.iter().enumerate() {
            assert_eq!(report.generation, i);
            assert_eq!(report.center_count, 3);
            assert_eq!(report.best_centers.len(), 3);
        }
    }

    #[test]
    fn test_stops_on_generation_cap() {
        let instance = create_test_instance();
        let config = small_config().with_max_generations(5).with_max_epochs(100);
        let result = GeneticAlgorithm::new(&instance, config).unwrap().run().unwrap();

        assert_eq!(result.stop_reason, StopReason::MaxGenerationsReached);
        assert_eq!(result.generations, 5);
        assert_eq!(result.final_generation, 4);
    }

    #[test]
    fn test_stops_on_stagnation_exactly_when_window_is_flat() {
        let instance = create_test_instance();
        let epochs = 4;
        let config = small_config().with_max_generations(500).with_max_epochs(epochs);
        let result = GeneticAlgorithm::new(&instance, config).unwrap().run().unwrap();

        assert_eq!(result.stop_reason, StopReason::Stagnation);
        let h = &result.score_history;
        assert!(h.len() >= epochs);
        assert!(h[h.len() - epochs..].iter().all(|&s| s == h[h.len() - 1]));
        // no earlier flat window of the same length
        for end in epochs..h.len() {
            let window = &h[end - epochs..end];
            assert!(!window.iter().all(|&s| s == window[0]));
        }
    }

    #[test]
    fn test_single_epoch_stops_after_first_generation() {
        let instance = create_test_instance();
        let config = small_config().with_max_epochs(1);
        let result = GeneticAlgorithm::new(&instance, config).unwrap().run().unwrap();

        assert_eq!(result.stop_reason, StopReason::Stagnation);
        assert_eq!(result.generations, 1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let instance = create_test_instance();
        let a = GeneticAlgorithm::new(&instance, small_config()).unwrap().run().unwrap();
        let b = GeneticAlgorithm::new(&instance, small_config()).unwrap().run().unwrap();

        assert_eq!(a.score_history, b.score_history);
        assert_eq!(a.best_chromosome, b.best_chromosome);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let instance = create_test_instance();
        let seq = GeneticAlgorithm::new(&instance, small_config()).unwrap().run().unwrap();
        let par = GeneticAlgorithm::new(&instance, small_config().with_parallel(true))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(seq.score_history, par.score_history);
        assert_eq!(seq.best_centers, par.best_centers);
    }

    #[test]
    fn test_cancel_flag_is_checked_between_generations() {
        let instance = create_test_instance();
        let flag = Arc::new(AtomicBool::new(false));
        let config = small_config().with_max_generations(100).with_max_epochs(100);
        let mut ga = GeneticAlgorithm::new(&instance, config)
            .unwrap()
            .with_cancel(flag.clone());

        let mut observer = |report: &GenerationReport| {
            if report.generation == 2 {
                flag.store(true, Ordering::Relaxed);
            }
        };
        let result = ga.run_with_observer(&mut observer).unwrap();

        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.generations, 3);
    }

    #[test]
    fn test_cancel_before_start_still_runs_one_generation() {
        let instance = create_test_instance();
        let flag = Arc::new(AtomicBool::new(true));
        let result = GeneticAlgorithm::new(&instance, small_config())
            .unwrap()
            .with_cancel(flag)
            .run()
            .unwrap();

        assert_eq!(result.generations, 1);
        assert_eq!(result.stop_reason, StopReason::Cancelled);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let instance = create_test_instance();
        let config = small_config().with_centers(12);
        assert!(matches!(
            GeneticAlgorithm::new(&instance, config),
            Err(KCenterError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_missing_edge_weight_aborts_run() {
        let mut edges = Vec::new();
        for i in 0..20 {
            edges.push((i, (i + 1) % 20, 1.0));
        }
        let instance = KCenterInstance::from_edges("ring", 20, &edges).unwrap();
        let mut ga = GeneticAlgorithm::new(&instance, small_config()).unwrap();

        assert!(matches!(
            ga.run(),
            Err(KCenterError::MissingEdgeWeight { .. })
        ));
    }
}
