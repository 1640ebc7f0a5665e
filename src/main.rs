//! k-Center GA - Command Line Interface
//!
//! Solves the metric k-center problem with a genetic algorithm, a
//! farthest-first baseline or exhaustive search.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use kcenter_ga::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use kcenter_ga::config::RunConfig;
use kcenter_ga::error::Result;
use kcenter_ga::exact::{ExhaustiveConfig, ExhaustiveSolver};
use kcenter_ga::heuristics::construction::{ConstructionHeuristic, FarthestFirstHeuristic};
use kcenter_ga::heuristics::genetic::{GenerationReport, GeneticAlgorithm, LogObserver, ProgressObserver};
use kcenter_ga::instance::KCenterInstance;
use kcenter_ga::solution::Solution;
use kcenter_ga::visualization::Visualizer;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kcenter-ga")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm solver for the metric k-center problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single instance
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "ga")]
        algorithm: Algorithm,

        /// JSON run configuration; flags below override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of centers
        #[arg(short, long)]
        k: Option<usize>,

        /// Population size (even, at least 16)
        #[arg(short, long)]
        population: Option<usize>,

        /// Mutation rate in [0, 1]
        #[arg(short, long)]
        mutation_rate: Option<f64>,

        /// Maximum number of generations
        #[arg(short, long)]
        generations: Option<usize>,

        /// Stop after this many generations without a change of the best score
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Evaluate sequentially instead of on the thread pool
        #[arg(long)]
        sequential: bool,

        /// Output solution to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate SVG visualization
        #[arg(long)]
        visualize: bool,

        /// Show a progress bar during the genetic search
        #[arg(long)]
        progress: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of genetic runs per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Number of centers
        #[arg(short, long, default_value = "13")]
        k: usize,

        /// JSON run configuration for the genetic search
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Largest `C(N, k)` solved exhaustively
        #[arg(long, default_value = "2000000")]
        exact_limit: u64,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of centers for the quick baseline
        #[arg(short, long, default_value = "13")]
        k: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Genetic Algorithm
    Ga,
    /// Farthest-first traversal (Gonzalez)
    FarthestFirst,
    /// Exhaustive search (small instances only)
    Exact,
}

/// Overrides given on the command line
struct SolveOptions {
    k: Option<usize>,
    population: Option<usize>,
    mutation_rate: Option<f64>,
    generations: Option<usize>,
    epochs: Option<usize>,
    seed: Option<u64>,
    sequential: bool,
}

impl SolveOptions {
    fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(k) = self.k {
            config.centers = k;
        }
        if let Some(p) = self.population {
            config.population_size = p;
        }
        if let Some(r) = self.mutation_rate {
            config.mutation_rate = r;
        }
        if let Some(g) = self.generations {
            config.max_generations = g;
        }
        if let Some(e) = self.epochs {
            config.max_epochs = e;
        }
        if let Some(s) = self.seed {
            config.seed = s;
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}

/// Drives an indicatif bar from generation reports
struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    fn new(max_generations: usize) -> Self {
        let bar = ProgressBar::new(max_generations as u64);
        let style = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} gen  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        ProgressBarObserver { bar }
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_generation(&mut self, report: &GenerationReport) {
        self.bar.set_position(report.generation as u64 + 1);
        self.bar.set_message(format!("best {:.3}", report.best_score));
        LogObserver.on_generation(report);
    }
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Solve { verbose: true, .. });
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let outcome = match cli.command {
        Commands::Solve {
            instance,
            algorithm,
            config,
            k,
            population,
            mutation_rate,
            generations,
            epochs,
            seed,
            sequential,
            output,
            visualize,
            progress,
            verbose,
        } => {
            let options = SolveOptions {
                k,
                population,
                mutation_rate,
                generations,
                epochs,
                seed,
                sequential,
            };
            solve_instance(&instance, algorithm, config.as_deref(), &options, output, visualize, progress, verbose)
        }

        Commands::Benchmark {
            dir,
            output,
            runs,
            k,
            config,
            exact_limit,
            max_size,
        } => run_benchmark(&dir, &output, runs, k, config.as_deref(), exact_limit, max_size),

        Commands::Analyze { instance, k } => analyze_instance(&instance, k),
    };

    if let Err(e) = outcome {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &Path,
    algorithm: Algorithm,
    config_path: Option<&Path>,
    options: &SolveOptions,
    output: Option<PathBuf>,
    visualize: bool,
    progress: bool,
    verbose: bool,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let instance = KCenterInstance::from_file(path)?;

    let base = match config_path {
        Some(p) => RunConfig::from_json_file(p)?,
        None => RunConfig::default(),
    };
    let config = options.apply(base);

    if verbose {
        println!("{}", instance.statistics());
        println!("Configuration: {:?}", config);
    }

    println!("Solving with {:?} algorithm (k = {})...", algorithm, config.centers);

    let mut history = Vec::new();
    let solution = match algorithm {
        Algorithm::Ga => {
            let max_generations = config.max_generations;
            let mut ga = GeneticAlgorithm::new(&instance, config)?;
            let result = if progress {
                let mut observer = ProgressBarObserver::new(max_generations);
                let result = ga.run_with_observer(&mut observer);
                observer.bar.finish();
                result?
            } else {
                ga.run()?
            };
            println!("Stop reason: {}", result.stop_reason);
            println!(
                "Best ever: {:.3} {:?}",
                result.best_ever_score, result.best_ever_centers
            );
            history = result.score_history.clone();
            Solution::from_search(&instance, &result)?
        }

        Algorithm::FarthestFirst => FarthestFirstHeuristic::new(config.centers)
            .with_seed(config.seed)
            .multi_start(10)
            .construct(&instance)?,

        Algorithm::Exact => {
            let result = ExhaustiveSolver::new(ExhaustiveConfig::default()).solve(&instance, config.centers)?;
            println!("Status: {}", result.status);
            result.solution
        }
    };

    println!("\n========== Results ==========");
    println!("{}", solution);

    if verbose {
        for &c in &solution.centers {
            println!("  Center {} serves {:?}", c, solution.cluster(c));
        }
    }

    if let Some(out_path) = output {
        solution.save_json(&out_path)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if visualize {
        let viz = Visualizer::new();
        match viz.generate_svg(&instance, &solution) {
            Ok(svg) => {
                let svg_path = path.with_extension("svg");
                viz.save_svg(&svg, &svg_path)?;
                println!("Visualization saved to {:?}", svg_path);
            }
            Err(e) => log::warn!("No solution drawing: {}", e),
        }

        if !history.is_empty() {
            let conv_svg = viz.generate_convergence_svg(&instance.name, &history);
            let conv_path = path.with_extension("convergence.svg");
            viz.save_svg(&conv_svg, &conv_path)?;
            println!("Convergence plot saved to {:?}", conv_path);
        }

        let data_path = path.with_extension("plot.txt");
        std::fs::write(&data_path, viz.export_plot_data(&instance, &solution, &history))?;
        println!("Plot data saved to {:?}", data_path);
    }

    Ok(())
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    k: usize,
    config_path: Option<&Path>,
    exact_limit: u64,
    max_size: Option<usize>,
) -> Result<()> {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|i| i.dimension <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        log::error!("No instances found in {:?}", dir);
        return Ok(());
    }

    std::fs::create_dir_all(output)?;

    let ga = match config_path {
        Some(p) => RunConfig::from_json_file(p)?,
        None => RunConfig::default(),
    }
    .with_centers(k);

    let config = BenchmarkConfig {
        num_runs: runs,
        ga,
        exact_max_combinations: exact_limit,
        max_dimension: max_size.unwrap_or(usize::MAX),
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances);

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn analyze_instance(path: &Path, k: usize) -> Result<()> {
    let instance = KCenterInstance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    if !instance.is_complete() {
        println!("\nThe graph is incomplete: the k-center objective is undefined for it.");
        return Ok(());
    }

    if k < 1 || k >= instance.dimension {
        println!("\nNo baseline: k = {} needs at least {} nodes.", k, k + 1);
        return Ok(());
    }

    let single = FarthestFirstHeuristic::new(k).construct(&instance)?;
    let multi = FarthestFirstHeuristic::new(k).multi_start(20).construct(&instance)?;

    println!("\nQuick Solution Estimates (k = {}):", k);
    println!("  Farthest-first: {:.3}", single.score);
    println!("  Farthest-first (20 starts): {:.3}", multi.score);
    println!("  Lower bound (half of 2-approximation): {:.3}", multi.score / 2.0);

    Ok(())
}
