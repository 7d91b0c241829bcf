//! Criterion benchmarks for the optimization methods.
//!
//! Uses the sphere and Rosenbrock functions to measure algorithm overhead
//! independent of any real objective.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_optflow::bfgs::{BfgsConfig, BfgsRunner};
use u_optflow::composite::EnsembleRunner;
use u_optflow::ga::{GaConfig, GaRunner};
use u_optflow::objective::{GradientFn, ObjectiveAdapter, ScalarFn};
use u_optflow::pso::{PsoConfig, PsoRunner};
use u_optflow::sa::{SaConfig, SaRunner};
use u_optflow::{OptimizationConfig, RunContext};

fn sphere() -> ObjectiveAdapter {
    ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
        (x.iter().map(|v| v * v).sum(), x.iter().map(|v| 2.0 * v).collect())
    }))
}

fn rosenbrock() -> ObjectiveAdapter {
    ObjectiveAdapter::minimize(ScalarFn(|x: &[f64]| {
        x.windows(2)
            .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
            .sum()
    }))
}

fn start(dim: usize) -> Vec<f64> {
    (0..dim).map(|i| if i % 2 == 0 { -1.2 } else { 1.0 }).collect()
}

fn bench_bfgs_rosenbrock(c: &mut Criterion) {
    let mut group = c.benchmark_group("bfgs_rosenbrock");
    let objective = rosenbrock();
    let config = BfgsConfig::default().with_max_iterations(200);

    for &dim in &[2, 10, 30] {
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |b, &dim| {
            b.iter(|| {
                let mut ctx = RunContext::new("bench", start(dim), OptimizationConfig::default());
                let result = BfgsRunner::run_with_config(&mut ctx, black_box(&objective), &config);
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_ga_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_sphere");
    group.sample_size(10);
    let objective = sphere();

    for &(dim, pop) in &[(10, 50), (50, 100)] {
        for parallel in [false, true] {
            let config = GaConfig::default()
                .with_population_size(pop)
                .with_max_iterations(50)
                .with_tolerance(0.0)
                .with_seed(42)
                .with_parallel(parallel);
            let label = if parallel { "par" } else { "seq" };
            group.bench_with_input(
                BenchmarkId::new(format!("d{dim}_p{pop}_{label}"), dim),
                &config,
                |b, config| {
                    b.iter(|| {
                        let mut ctx =
                            RunContext::new("bench", vec![1.0; dim], OptimizationConfig::default());
                        let result = GaRunner::run_with_config(&mut ctx, black_box(&objective), config);
                        black_box(result)
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_pso_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("pso_sphere");
    group.sample_size(10);
    let objective = sphere();

    for &dim in &[10, 50] {
        let config = PsoConfig {
            max_iterations: 100,
            tolerance: 0.0,
            seed: Some(42),
            ..PsoConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(dim), &config, |b, config| {
            b.iter(|| {
                let mut ctx = RunContext::new("bench", vec![1.0; dim], OptimizationConfig::default());
                let result = PsoRunner::run_with_config(&mut ctx, black_box(&objective), config);
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_sa_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("sa_sphere");
    let objective = sphere();

    for &dim in &[10, 100] {
        let config = SaConfig::default()
            .with_initial_temperature(10.0)
            .with_cooling_rate(0.99)
            .with_max_iterations(1000)
            .with_tolerance(0.0)
            .with_seed(42);
        group.bench_with_input(BenchmarkId::from_parameter(dim), &config, |b, config| {
            b.iter(|| {
                let mut ctx = RunContext::new("bench", vec![1.0; dim], OptimizationConfig::default());
                let result = SaRunner::run_with_config(&mut ctx, black_box(&objective), config);
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_ensemble(c: &mut Criterion) {
    let objective = sphere();
    let base = OptimizationConfig::default()
        .with_learning_rate(0.1)
        .with_max_iterations(200);
    let variants = ["sgd", "adam", "bfgs", "nonlinear_cg"];

    c.bench_function("ensemble_sphere_d20", |b| {
        b.iter(|| {
            let ensemble = EnsembleRunner::run(&base, &[1.0; 20], &variants, black_box(&objective));
            black_box(ensemble)
        })
    });
}

criterion_group!(
    benches,
    bench_bfgs_rosenbrock,
    bench_ga_sphere,
    bench_pso_sphere,
    bench_sa_sphere,
    bench_ensemble
);
criterion_main!(benches);
