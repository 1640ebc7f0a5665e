//! Benchmarking and experimentation module.
//!
//! Runs the genetic search over several seeds next to the farthest-first
//! baseline and, for small instances, the exhaustive solver. Results are
//! collected per run, aggregated per algorithm and exported to CSV.

use crate::config::RunConfig;
use crate::error::Result;
use crate::exact::{binomial, ExhaustiveConfig, ExhaustiveSolver};
use crate::heuristics::construction::{ConstructionHeuristic, FarthestFirstHeuristic};
use crate::heuristics::genetic::GeneticAlgorithm;
use crate::instance::{DistanceOracle, KCenterInstance};
use crate::solution::{gap_percent, Solution};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Number of centers
    pub centers: usize,
    /// Seed of the run
    pub seed: u64,
    /// Solution score (covering radius)
    pub score: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    /// Why the run stopped (genetic search only)
    pub stop_reason: Option<String>,
    /// Gap to best known, in percent
    pub gap_to_best: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Average score
    pub avg_score: f64,
    /// Best score
    pub best_score: f64,
    /// Worst score
    pub worst_score: f64,
    /// Sample standard deviation of the score
    pub std_score: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
    /// Average gap to best known
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of genetic runs per instance, with seeds `ga.seed + run`
    pub num_runs: usize,
    /// Genetic search parameters; `centers` is used by every algorithm
    pub ga: RunConfig,
    /// Random starts for the farthest-first baseline
    pub farthest_first_starts: usize,
    /// Run the exhaustive solver when `C(N, k)` is below this limit
    pub exact_max_combinations: u64,
    /// Exhaustive solver time limit
    pub exact_time_limit: f64,
    /// Skip instances with more nodes than this
    pub max_dimension: usize,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            ga: RunConfig::default(),
            farthest_first_starts: 10,
            exact_max_combinations: 2_000_000,
            exact_time_limit: 300.0,
            max_dimension: 1000,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    best_known: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
        }
    }

    /// Set best known score for an instance
    pub fn set_best_known(&mut self, instance_name: &str, score: f64) {
        self.best_known.insert(instance_name.to_string(), score);
    }

    /// Run the genetic search once per seed
    pub fn run_genetic(&mut self, instance: &KCenterInstance) -> Result<()> {
        for run in 0..self.config.num_runs {
            let config = self.config.ga.clone().with_seed(self.config.ga.seed + run as u64);
            let seed = config.seed;
            let mut ga = GeneticAlgorithm::new(instance, config)?;
            let result = ga.run()?;
            let solution = Solution::from_search(instance, &result)?;
            log::info!(
                "[Benchmark] {} GA seed {}: {:.3} in {:.2}s",
                instance.name,
                seed,
                solution.score,
                solution.computation_time
            );
            self.record_result(instance, &solution, seed);
        }
        Ok(())
    }

    /// Run the farthest-first baseline
    pub fn run_farthest_first(&mut self, instance: &KCenterInstance) -> Result<()> {
        let heuristic = FarthestFirstHeuristic::new(self.config.ga.centers)
            .with_seed(self.config.ga.seed)
            .multi_start(self.config.farthest_first_starts);
        let solution = heuristic.construct(instance)?;
        self.record_result(instance, &solution, heuristic.seed);
        Ok(())
    }

    /// Run the exhaustive solver when the instance is small enough.
    ///
    /// An optimal result becomes the best known score of the instance.
    pub fn run_exact(&mut self, instance: &KCenterInstance) -> Result<Option<Solution>> {
        let k = self.config.ga.centers;
        if binomial(instance.node_count(), k) > self.config.exact_max_combinations {
            log::debug!("[Benchmark] {} too large for exhaustive search", instance.name);
            return Ok(None);
        }

        let solver = ExhaustiveSolver::new(ExhaustiveConfig {
            max_combinations: self.config.exact_max_combinations,
            time_limit: self.config.exact_time_limit,
        });
        let result = solver.solve(instance, k)?;
        if result.optimal {
            self.set_best_known(&instance.name, result.solution.score);
        }
        self.record_result(instance, &result.solution, 0);
        Ok(Some(result.solution))
    }

    /// Run every algorithm on one instance
    pub fn run_full_benchmark(&mut self, instance: &KCenterInstance) -> Result<()> {
        log::info!(
            "Running benchmark on instance: {} ({} nodes, k = {})",
            instance.name,
            instance.dimension,
            self.config.ga.centers
        );
        self.run_exact(instance)?;
        self.run_farthest_first(instance)?;
        self.run_genetic(instance)?;
        self.fill_gaps(&instance.name);
        Ok(())
    }

    /// Run benchmark on multiple instances.
    ///
    /// Instances that are too large or cannot host `k` centers are skipped; a
    /// failing instance is logged and does not stop the others.
    pub fn run_on_instances(&mut self, instances: &[KCenterInstance]) {
        for instance in instances {
            if instance.dimension > self.config.max_dimension {
                log::info!("[Benchmark] Skipping {} ({} nodes)", instance.name, instance.dimension);
                continue;
            }
            if let Err(e) = self.run_full_benchmark(instance) {
                log::warn!("[Benchmark] {} failed: {}", instance.name, e);
            }
        }
    }

    fn record_result(&mut self, instance: &KCenterInstance, solution: &Solution, seed: u64) {
        let mut result = AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension,
            centers: solution.centers.len(),
            seed,
            score: solution.score,
            time: solution.computation_time,
            iterations: solution.iterations,
            stop_reason: solution.stop_reason.map(|r| r.to_string()),
            gap_to_best: None,
        };

        if let Some(&best) = self.best_known.get(&instance.name) {
            result.gap_to_best = Some(solution.gap_to(best));
        }

        self.results.push(result);
    }

    /// Fill missing gaps of an instance against the best known or best observed score
    fn fill_gaps(&mut self, instance_name: &str) {
        let observed = self
            .results
            .iter()
            .filter(|r| r.instance == instance_name)
            .map(|r| r.score)
            .fold(f64::INFINITY, f64::min);
        let reference = self
            .best_known
            .get(instance_name)
            .copied()
            .unwrap_or(observed)
            .min(observed);

        for result in self.results.iter_mut().filter(|r| r.instance == instance_name) {
            if result.gap_to_best.is_none() && reference.is_finite() {
                result.gap_to_best = Some(gap_percent(result.score, reference));
            }
        }
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map
                .entry(result.algorithm.clone())
                .or_insert_with(Vec::new)
                .push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = stats_map
            .into_iter()
            .map(|(algorithm, results)| {
                let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_best).collect();

                let std_score = if scores.len() > 1 { scores.iter().std_dev() } else { 0.0 };

                AlgorithmStatistics {
                    algorithm,
                    num_runs: results.len(),
                    avg_score: scores.iter().mean(),
                    best_score: scores.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_score: scores.iter().cloned().fold(0.0, f64::max),
                    std_score,
                    avg_time: times.iter().mean(),
                    total_time: times.iter().sum(),
                    avg_gap: if gaps.is_empty() { None } else { Some(gaps.iter().mean()) },
                }
            })
            .collect();

        statistics.sort_by_key(|s| OrderedFloat(s.avg_score));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       k-Center Benchmark Report\n");
        report.push_str("========================================\n\n");

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(92).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<26} {:>6} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Avg Score", "Best Score", "Std", "Avg Gap%", "Avg Time"
        ));
        report.push_str("-".repeat(92).as_str());
        report.push('\n');

        for stat in &self.compute_statistics() {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<26} {:>6} {:>12.3} {:>12.3} {:>12.3} {:>10} {:>10.4}\n",
                stat.algorithm,
                stat.num_runs,
                stat.avg_score,
                stat.best_score,
                stat.std_score,
                gap_str,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(92).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.score < entry.score {
                *entry = result;
            }
        }

        let mut names: Vec<&&str> = instance_best.keys().collect();
        names.sort();
        for name in names {
            let best = instance_best[*name];
            let marker = if self.best_known.contains_key(*name) { " (optimal known)" } else { "" };
            report.push_str(&format!("  {}: {:.3} ({}){}\n", name, best.score, best.algorithm, marker));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Get best known values
    pub fn best_known(&self) -> &HashMap<String, f64> {
        &self.best_known
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }
}

/// Helper function to load instances from a directory
///
/// Reads every `.tsp` file; files that fail to parse are logged and skipped.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<KCenterInstance> {
    let mut instances = Vec::new();

    match std::fs::read_dir(dir.as_ref()) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "tsp").unwrap_or(false) {
                    match KCenterInstance::from_file(&path) {
                        Ok(instance) => instances.push(instance),
                        Err(e) => log::warn!("Could not load {}: {}", path.display(), e),
                    }
                }
            }
        }
        Err(e) => log::warn!("Could not read {}: {}", dir.as_ref().display(), e),
    }

    // Sort by dimension
    instances.sort_by_key(|i| i.dimension);

    instances
}
