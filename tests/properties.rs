//! Property tests for run bookkeeping, checkpoints and method budgets.

use proptest::prelude::*;
use u_optflow::composite::{EnsembleRunner, HybridConfig, HybridRunner};
use u_optflow::objective::{GradientFn, ObjectiveAdapter};
use u_optflow::sa::acceptance_probability;
use u_optflow::{MethodRegistry, OptimizationConfig, RunContext, TerminationReason};

fn sphere() -> ObjectiveAdapter {
    ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
        (x.iter().map(|v| v * v).sum(), x.iter().map(|v| 2.0 * v).collect())
    }))
}

fn loss_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1e6..1e6f64,
        1 => Just(f64::INFINITY),
    ]
}

fn logged_run(losses: &[f64], dim: usize) -> RunContext {
    let mut ctx = RunContext::new("prop", vec![0.0; dim], OptimizationConfig::default());
    ctx.start("manual").unwrap();
    for (i, &loss) in losses.iter().enumerate() {
        let x = vec![i as f64; dim];
        ctx.log_step(i, loss, &x, Some(&x), &[("t", loss)]).unwrap();
    }
    ctx
}

proptest! {
    #[test]
    fn history_tracks_steps_and_best(
        losses in prop::collection::vec(loss_value(), 0..60),
        dim in 1usize..5,
    ) {
        let mut ctx = RunContext::new("prop", vec![0.0; dim], OptimizationConfig::default());
        ctx.start("manual").unwrap();
        let mut previous_best = f64::INFINITY;
        for (i, &loss) in losses.iter().enumerate() {
            ctx.log_step(i, loss, &vec![0.5; dim], None, &[]).unwrap();
            prop_assert_eq!(ctx.loss_history().len(), ctx.steps().len());
            prop_assert!(ctx.best_loss() <= previous_best);
            previous_best = ctx.best_loss();
        }
        let min = losses.iter().copied().fold(f64::INFINITY, f64::min);
        prop_assert_eq!(ctx.best_loss(), min);
        for &loss in ctx.loss_history() {
            prop_assert!(ctx.best_loss() <= loss);
        }
    }

    #[test]
    fn best_parameters_come_from_first_minimum(
        losses in prop::collection::vec(-100.0..100.0f64, 1..40),
    ) {
        let ctx = logged_run(&losses, 2);
        let mut first_min = 0;
        for (i, &loss) in losses.iter().enumerate() {
            if loss < losses[first_min] {
                first_min = i;
            }
        }
        let expected = vec![first_min as f64; 2];
        prop_assert_eq!(ctx.best_parameters(), Some(expected.as_slice()));
    }

    #[test]
    fn checkpoint_round_trip(
        losses in prop::collection::vec(loss_value(), 0..30),
        dim in 1usize..4,
        finish in any::<bool>(),
    ) {
        let mut ctx = logged_run(&losses, dim);
        if finish {
            ctx.finish(TerminationReason::Converged).unwrap();
        }

        let restored = RunContext::deserialize(&ctx.serialize().unwrap()).unwrap();
        prop_assert_eq!(restored.best_loss(), ctx.best_loss());
        prop_assert_eq!(restored.best_parameters(), ctx.best_parameters());
        prop_assert_eq!(restored.termination_reason(), ctx.termination_reason());
        prop_assert_eq!(restored.steps(), ctx.steps());
        prop_assert_eq!(restored.loss_history(), ctx.loss_history());
        prop_assert_eq!(restored.lifecycle(), ctx.lifecycle());
    }

    #[test]
    fn acceptance_of_improvements_is_certain(
        delta in -1e9..=0.0f64,
        temperature in 0.0..1e3f64,
    ) {
        prop_assert_eq!(acceptance_probability(delta, temperature), 1.0);
    }

    #[test]
    fn acceptance_of_worse_moves_is_metropolis(
        delta in 1e-9..1e3f64,
        temperature in 1e-6..1e3f64,
    ) {
        let p = acceptance_probability(delta, temperature);
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert!((p - (-delta / temperature).exp()).abs() < 1e-12);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_method_respects_its_budget(
        method in prop::sample::select(MethodRegistry::names()),
        max_iterations in 1usize..25,
        x0 in prop::collection::vec(-5.0..5.0f64, 1..4),
        seed in any::<u64>(),
    ) {
        let options = OptimizationConfig::default()
            .with_max_iterations(max_iterations)
            .with_population_size(6)
            .with_swarm_size(6)
            .with_seed(seed);
        let mut ctx = RunContext::new("budget", x0, options);
        let result = MethodRegistry::get(method)(&mut ctx, &sphere()).unwrap();
        prop_assert!(result.iterations <= max_iterations);
        prop_assert_eq!(ctx.loss_history().len(), ctx.steps().len());
        prop_assert!(result.termination_reason.is_some());
        for pair in ctx.steps().windows(2) {
            prop_assert_eq!(pair[0].parameters.len(), pair[1].parameters.len());
        }
    }

    #[test]
    fn hybrid_stays_within_total_budget(
        methods in prop::collection::vec(
            prop::sample::select(vec!["sgd", "adam", "bfgs", "nonlinear_cg", "momentum"]),
            1..4,
        ),
        weights in prop::collection::vec(prop::option::of(0.0..1.5f64), 3),
        max_iterations in 1usize..120,
        x0 in -5.0..5.0f64,
    ) {
        let mut config = HybridConfig::new(methods.clone()).with_max_iterations(max_iterations);
        for (method, weight) in methods.iter().zip(&weights) {
            if let Some(w) = weight {
                config = config.with_weight(*method, *w);
            }
        }
        let mut ctx = RunContext::new("hybrid", vec![x0], OptimizationConfig::default());
        let result = HybridRunner::run_with_config(&mut ctx, &sphere(), &config).unwrap();
        prop_assert!(result.iterations <= max_iterations);
        for (i, step) in ctx.steps().iter().enumerate() {
            prop_assert_eq!(step.iteration, i);
        }
        if let Some(&first) = ctx.loss_history().first() {
            prop_assert!(result.final_loss <= first);
        }
    }

    #[test]
    fn ensemble_averages_members(
        x0 in prop::collection::vec(-5.0..5.0f64, 1..4),
    ) {
        let variants = ["sgd", "bfgs", "nonlinear_cg"];
        let base = OptimizationConfig::default().with_max_iterations(30);
        let ensemble = EnsembleRunner::run(&base, &x0, &variants, &sphere()).unwrap();
        let result = &ensemble.result;

        for k in 0..x0.len() {
            let mean: f64 = result.method_results.iter().map(|r| r.parameters[k]).sum::<f64>() / 3.0;
            prop_assert!((result.ensemble_parameters[k] - mean).abs() < 1e-9);
        }
        let best = result
            .method_results
            .iter()
            .map(|r| r.final_loss)
            .fold(f64::INFINITY, f64::min);
        prop_assert_eq!(result.best_loss, best);
        let idx = variants.iter().position(|v| *v == result.best_method).unwrap();
        prop_assert_eq!(result.method_results[idx].final_loss, best);
    }
}
