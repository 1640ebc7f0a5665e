use kcenter_ga::config::RunConfig;
use kcenter_ga::exact::ExhaustiveSolver;
use kcenter_ga::heuristics::construction::{ConstructionHeuristic, FarthestFirstHeuristic};
use kcenter_ga::heuristics::genetic::{GeneticAlgorithm, History, StopReason};
use kcenter_ga::instance::KCenterInstance;
use kcenter_ga::solution::Solution;
use kcenter_ga::KCenterError;

fn six_node_matrix() -> KCenterInstance {
    KCenterInstance::from_matrix(
        "six",
        vec![
            vec![0.0, 2.0, 3.0, 9.0, 8.0, 7.0],
            vec![2.0, 0.0, 4.0, 8.0, 9.0, 6.0],
            vec![3.0, 4.0, 0.0, 7.0, 6.0, 9.0],
            vec![9.0, 8.0, 7.0, 0.0, 3.0, 2.0],
            vec![8.0, 9.0, 6.0, 3.0, 0.0, 4.0],
            vec![7.0, 6.0, 9.0, 2.0, 4.0, 0.0],
        ],
    )
    .unwrap()
}

fn scenario_config() -> RunConfig {
    RunConfig::default()
        .with_centers(2)
        .with_population_size(16)
        .with_mutation_rate(0.0)
        .with_max_generations(50)
        .with_max_epochs(10)
        .with_seed(2024)
}

#[test]
fn best_score_never_increases_without_mutation() {
    let instance = six_node_matrix();
    let mut history = History::default();
    let mut ga = GeneticAlgorithm::new(&instance, scenario_config()).unwrap();
    let result = ga.run_with_observer(&mut history).unwrap();

    assert_eq!(result.best_centers.len(), 2);
    assert!(result.generations <= 50);
    assert_eq!(history.reports.len(), result.generations);

    for pair in history.reports.windows(2) {
        assert!(
            pair[1].best_score <= pair[0].best_score,
            "generation {} went from {} to {}",
            pair[1].generation,
            pair[0].best_score,
            pair[1].best_score
        );
    }

    // without mutation the last score is also the best one ever seen
    assert_eq!(result.best_score, result.best_ever_score);
}

#[test]
fn genetic_search_reaches_exhaustive_optimum_on_six_nodes() {
    let instance = six_node_matrix();
    let optimum = ExhaustiveSolver::default().solve(&instance, 2).unwrap();
    let config = scenario_config()
        .with_population_size(40)
        .with_mutation_rate(0.2)
        .with_max_epochs(30);
    let result = GeneticAlgorithm::new(&instance, config).unwrap().run().unwrap();

    // {0, 3} covers every node within 3
    assert_eq!(optimum.solution.score, 3.0);
    assert!(result.best_ever_score >= optimum.solution.score);
    assert_eq!(result.best_ever_score, optimum.solution.score);
}

#[test]
fn result_converts_to_a_consistent_solution() {
    let instance = six_node_matrix();
    let result = GeneticAlgorithm::new(&instance, scenario_config())
        .unwrap()
        .run()
        .unwrap();
    let solution = Solution::from_search(&instance, &result).unwrap();

    assert_eq!(solution.centers, result.best_centers);
    assert_eq!(solution.score, result.best_score);
    assert_eq!(solution.assignment.len(), 6);
    for &c in &solution.centers {
        assert_eq!(solution.assignment[c], c);
    }
    assert!(matches!(
        solution.stop_reason,
        Some(StopReason::Stagnation) | Some(StopReason::MaxGenerationsReached)
    ));
}

#[test]
fn instance_file_to_solution() {
    let text = "NAME: ring8\nTYPE: TSP\nDIMENSION: 8\nEDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n\
1 0 0\n2 10 0\n3 20 0\n4 20 10\n5 20 20\n6 10 20\n7 0 20\n8 0 10\nEOF\n";
    let instance = KCenterInstance::parse_str(text).unwrap();
    assert_eq!(instance.dimension, 8);

    let baseline = FarthestFirstHeuristic::new(3).construct(&instance).unwrap();
    let config = RunConfig::default()
        .with_centers(3)
        .with_population_size(20)
        .with_max_generations(60)
        .with_max_epochs(20)
        .with_seed(3);
    let result = GeneticAlgorithm::new(&instance, config).unwrap().run().unwrap();

    let optimum = ExhaustiveSolver::default().solve(&instance, 3).unwrap().solution.score;

    assert_eq!(baseline.centers.len(), 3);
    assert_eq!(result.best_centers.len(), 3);
    assert!(result.best_ever_score >= optimum - 1e-9);
    // farthest-first is a 2-approximation on metric instances
    assert!(baseline.score <= 2.0 * optimum + 1e-9);
}

#[test]
fn invalid_parameters_are_reported_before_running() {
    let instance = six_node_matrix();
    for config in [
        scenario_config().with_centers(6),
        scenario_config().with_population_size(15),
        scenario_config().with_max_epochs(0),
    ] {
        assert!(matches!(
            GeneticAlgorithm::new(&instance, config),
            Err(KCenterError::InvalidParameters(_))
        ));
    }
}

#[test]
fn incomplete_graph_reports_missing_edge() {
    let edges: Vec<(usize, usize, f64)> = (0..17).map(|i| (i, i + 1, 1.0)).collect();
    let instance = KCenterInstance::from_edges("path", 18, &edges).unwrap();
    let config = scenario_config().with_centers(3);
    let mut ga = GeneticAlgorithm::new(&instance, config).unwrap();

    assert!(matches!(ga.run(), Err(KCenterError::MissingEdgeWeight { .. })));
}
