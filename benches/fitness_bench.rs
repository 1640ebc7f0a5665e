use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kcenter_ga::chromosome::initialize_population;
use kcenter_ga::heuristics::fitness::{evaluate_population, Individual};
use kcenter_ga::instance::KCenterInstance;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn random_instance(n: usize, seed: u64) -> KCenterInstance {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let points: Vec<(f64, f64)> = (0..n)
        .map(|_| (rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)))
        .collect();
    KCenterInstance::from_coordinates("bench", &points)
}

fn bench_fitness_pass(c: &mut Criterion) {
    let instance = random_instance(146, 1);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let population: Vec<Individual> = initialize_population(146, 13, 140, &mut rng)
        .unwrap()
        .into_iter()
        .map(Individual::new)
        .collect();

    let mut group = c.benchmark_group("fitness_pass");
    for parallel in [false, true] {
        group.bench_with_input(
            BenchmarkId::from_parameter(if parallel { "parallel" } else { "sequential" }),
            &parallel,
            |b, &parallel| {
                b.iter(|| {
                    let mut pop = population.clone();
                    let mut rng = ChaCha8Rng::seed_from_u64(3);
                    evaluate_population(&instance, &mut pop, 13, &mut rng, parallel).unwrap();
                    black_box(pop[0].score)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_fitness_pass);
criterion_main!(benches);
