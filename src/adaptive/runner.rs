//! Shared loop for the adaptive steppers.

use super::config::{AdaptiveConfig, Stepper};
use super::schedule::LearningRate;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use log::debug;

/// Executes momentum SGD, RMSprop or Adagrad.
pub struct AdaptiveRunner;

impl AdaptiveRunner {
    /// Momentum SGD with hyperparameters read from the context.
    pub fn momentum(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = AdaptiveConfig::momentum(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    /// RMSprop with hyperparameters read from the context.
    pub fn rmsprop(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = AdaptiveConfig::rmsprop(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    /// Adagrad with hyperparameters read from the context.
    pub fn adagrad(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = AdaptiveConfig::adagrad(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &AdaptiveConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        let name = config.stepper.name();
        ctx.start(name)?;

        let mut x = ctx.current_parameters().to_vec();
        let mut state = vec![0.0; x.len()];
        let mut lr = LearningRate::new(config.scheduler, config.learning_rate, config.max_iterations);

        for i in 0..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(x, TerminationReason::Cancelled);
            }

            let (loss, grad) = objective.loss_and_gradient(&x)?;
            if !loss.is_finite() || !linalg::all_finite(&grad) {
                debug!("{name} diverged at iteration {i}");
                let last = ctx.last_logged_parameters();
                return ctx.complete(last, TerminationReason::Diverged);
            }

            ctx.log_step(i, loss, &x, Some(&grad), &[("learning_rate", lr.current())])?;
            if ctx.loss_delta_below(config.tolerance) {
                return ctx.complete(x, TerminationReason::Converged);
            }

            apply(config.stepper, &mut x, &grad, &mut state, lr.current());
            lr.advance(loss);
        }

        ctx.complete(x, TerminationReason::MaxIterations)
    }
}

/// One in-place update. `state` is the momentum buffer or the squared
/// gradient accumulator, depending on the rule.
fn apply(stepper: Stepper, x: &mut [f64], grad: &[f64], state: &mut [f64], lr: f64) {
    for ((xi, &g), s) in x.iter_mut().zip(grad).zip(state.iter_mut()) {
        match stepper {
            Stepper::Momentum { momentum } => {
                *s = momentum * *s + g;
                *xi -= lr * *s;
            }
            Stepper::RmsProp { alpha, epsilon } => {
                *s = alpha * *s + (1.0 - alpha) * g * g;
                *xi -= lr * g / (s.sqrt() + epsilon);
            }
            Stepper::Adagrad { epsilon } => {
                *s += g * g;
                *xi -= lr * g / (s.sqrt() + epsilon);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::Scheduler;
    use crate::config::OptimizationConfig;
    use crate::objective::GradientFn;

    fn sphere() -> ObjectiveAdapter {
        ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
            (x.iter().map(|v| v * v).sum(), x.iter().map(|v| 2.0 * v).collect())
        }))
    }

    #[test]
    fn test_momentum_converges() {
        let options = OptimizationConfig::default()
            .with_max_iterations(2000)
            .with_tolerance(1e-10);
        let mut ctx = RunContext::new("m", vec![1.0], options);
        let result = AdaptiveRunner::momentum(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.method, "momentum");
        assert!(result.parameters[0].abs() < 1e-2, "x = {:?}", result.parameters);
    }

    #[test]
    fn test_rmsprop_converges() {
        let options = OptimizationConfig::default()
            .with_max_iterations(500)
            .with_tolerance(1e-10);
        let mut ctx = RunContext::new("r", vec![1.0], options);
        let result = AdaptiveRunner::rmsprop(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.method, "rmsprop");
        assert!(result.final_loss < 1e-4, "loss = {}", result.final_loss);
    }

    #[test]
    fn test_adagrad_converges() {
        let options = OptimizationConfig::default()
            .with_learning_rate(0.5)
            .with_max_iterations(200)
            .with_tolerance(1e-10);
        let mut ctx = RunContext::new("a", vec![1.0], options);
        let result = AdaptiveRunner::adagrad(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.method, "adagrad");
        assert!(result.final_loss < 1e-4, "loss = {}", result.final_loss);
    }

    #[test]
    fn test_first_momentum_update() {
        let config = AdaptiveConfig::new(Stepper::Momentum { momentum: 0.9 })
            .with_learning_rate(0.1)
            .with_max_iterations(3)
            .with_tolerance(0.0);
        let mut ctx = RunContext::new("m", vec![1.0], OptimizationConfig::default());
        AdaptiveRunner::run_with_config(&mut ctx, &sphere(), &config).unwrap();
        // b = 2, x = 1 - 0.2; then b = 0.9*2 + 1.6 = 3.4, x = 0.8 - 0.34
        assert!((ctx.steps()[1].parameters[0] - 0.8).abs() < 1e-12);
        assert!((ctx.steps()[2].parameters[0] - 0.46).abs() < 1e-12);
    }

    #[test]
    fn test_learning_rate_logged_with_schedule() {
        let options = OptimizationConfig {
            step_size: Some(2),
            gamma: Some(0.5),
            ..OptimizationConfig::default()
        }
        .with_scheduler("step")
        .with_learning_rate(0.001)
        .with_max_iterations(5)
        .with_tolerance(0.0);
        let mut ctx = RunContext::new("s", vec![1.0], options);
        AdaptiveRunner::adagrad(&mut ctx, &sphere()).unwrap();
        let lrs: Vec<f64> = ctx
            .steps()
            .iter()
            .map(|s| s.extra("learning_rate").unwrap())
            .collect();
        let expected = [0.001, 0.001, 0.0005, 0.0005, 0.00025];
        for (got, want) in lrs.iter().zip(expected) {
            assert!((got - want).abs() < 1e-15, "{lrs:?}");
        }
    }

    #[test]
    fn test_cosine_schedule_runs() {
        let config = AdaptiveConfig::new(Stepper::RmsProp {
            alpha: 0.99,
            epsilon: 1e-8,
        })
        .with_scheduler(Scheduler::Cosine)
        .with_max_iterations(10)
        .with_tolerance(0.0);
        let mut ctx = RunContext::new("c", vec![1.0], OptimizationConfig::default());
        let result = AdaptiveRunner::run_with_config(&mut ctx, &sphere(), &config).unwrap();
        assert_eq!(result.iterations, 10);
        let last_lr = ctx.steps()[9].extra("learning_rate").unwrap();
        assert!(last_lr < config.learning_rate);
    }
}
