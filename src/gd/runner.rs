//! Gradient descent loop.

use super::config::GdConfig;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use log::debug;

/// Executes fixed-step gradient descent.
pub struct GdRunner;

impl GdRunner {
    /// Registry name.
    pub const NAME: &'static str = "sgd";

    /// Runs gradient descent with hyperparameters read from the context.
    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = GdConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    /// Runs gradient descent with an explicit configuration.
    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &GdConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut x = ctx.current_parameters().to_vec();
        for i in 0..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(x, TerminationReason::Cancelled);
            }

            let (loss, grad) = objective.loss_and_gradient(&x)?;
            if !loss.is_finite() || !linalg::all_finite(&grad) {
                debug!("sgd diverged at iteration {i}");
                let last = ctx.last_logged_parameters();
                return ctx.complete(last, TerminationReason::Diverged);
            }

            ctx.log_step(i, loss, &x, Some(&grad), &[])?;
            if ctx.loss_delta_below(config.tolerance) {
                return ctx.complete(x, TerminationReason::Converged);
            }

            x = linalg::step(&x, -config.learning_rate, &grad);
        }

        ctx.complete(x, TerminationReason::MaxIterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizationConfig;
    use crate::objective::{GradientFn, ScalarFn};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn sphere() -> ObjectiveAdapter {
        ObjectiveAdapter::minimize(GradientFn(|x: &[f64]| {
            (x.iter().map(|v| v * v).sum(), x.iter().map(|v| 2.0 * v).collect())
        }))
    }

    fn context(x0: Vec<f64>, options: OptimizationConfig) -> RunContext {
        RunContext::new("gd", x0, options)
    }

    #[test]
    fn test_converges_on_sphere() {
        let options = OptimizationConfig::default()
            .with_learning_rate(0.1)
            .with_max_iterations(200)
            .with_tolerance(1e-9);
        let mut ctx = context(vec![5.0], options);
        let result = GdRunner::run(&mut ctx, &sphere()).unwrap();

        assert_eq!(result.termination_reason, Some(TerminationReason::Converged));
        assert!(result.parameters[0].abs() < 1e-3, "x = {:?}", result.parameters);
        assert!(result.iterations <= 200);
        assert_eq!(result.method, "sgd");
    }

    #[test]
    fn test_default_tolerance_gets_close() {
        let options = OptimizationConfig::default()
            .with_learning_rate(0.1)
            .with_max_iterations(200);
        let mut ctx = context(vec![5.0], options);
        let result = GdRunner::run(&mut ctx, &sphere()).unwrap();
        assert!(result.parameters[0].abs() < 2e-3, "x = {:?}", result.parameters);
    }

    #[test]
    fn test_respects_budget() {
        let options = OptimizationConfig::default()
            .with_learning_rate(1e-4)
            .with_max_iterations(5)
            .with_tolerance(0.0);
        let mut ctx = context(vec![5.0, -3.0], options);
        let result = GdRunner::run(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.iterations, 5);
        assert_eq!(result.termination_reason, Some(TerminationReason::MaxIterations));
        assert_eq!(ctx.loss_history().len(), ctx.steps().len());
    }

    #[test]
    fn test_gradients_recorded() {
        let options = OptimizationConfig::default().with_max_iterations(3);
        let mut ctx = context(vec![1.0], options);
        GdRunner::run(&mut ctx, &sphere()).unwrap();
        let first = &ctx.steps()[0];
        assert_eq!(first.gradient, Some(vec![2.0]));
        assert_eq!(first.gradient_norm, Some(2.0));
    }

    #[test]
    fn test_finite_difference_fallback() {
        let objective = ObjectiveAdapter::minimize(ScalarFn(|x: &[f64]| (x[0] - 1.0).powi(2)));
        let options = OptimizationConfig::default()
            .with_learning_rate(0.1)
            .with_tolerance(1e-12)
            .with_max_iterations(500);
        let mut ctx = context(vec![4.0], options);
        let result = GdRunner::run(&mut ctx, &objective).unwrap();
        assert!((result.parameters[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_diverges_on_nan() {
        // lr too large: iterates blow up until the loss overflows
        let options = OptimizationConfig::default()
            .with_learning_rate(10.0)
            .with_max_iterations(1000)
            .with_tolerance(0.0);
        let mut ctx = context(vec![1.0], options);
        let result = GdRunner::run(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.termination_reason, Some(TerminationReason::Diverged));
        assert!(ctx.loss_history().iter().all(|l| l.is_finite()));
        assert_eq!(ctx.current_parameters(), ctx.steps().last().unwrap().parameters.as_slice());
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut ctx = context(vec![1.0], OptimizationConfig::default()).with_cancel(flag);
        let result = GdRunner::run(&mut ctx, &sphere()).unwrap();
        assert_eq!(result.termination_reason, Some(TerminationReason::Cancelled));
        assert_eq!(result.iterations, 0);
        assert_eq!(result.parameters, vec![1.0]);
    }

    #[test]
    fn test_invalid_config() {
        let options = OptimizationConfig::default().with_learning_rate(-1.0);
        let mut ctx = context(vec![1.0], options);
        assert!(matches!(
            GdRunner::run(&mut ctx, &sphere()),
            Err(OptError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_objective_error_aborts() {
        use crate::error::ObjectiveError;
        use crate::objective::{FallibleFn, ObjectiveOutput};
        let objective = ObjectiveAdapter::minimize(FallibleFn(
            |_: &[f64]| -> Result<ObjectiveOutput, ObjectiveError> {
                Err(ObjectiveError::Raised("down".into()))
            },
        ));
        let mut ctx = context(vec![1.0], OptimizationConfig::default());
        assert!(matches!(
            GdRunner::run(&mut ctx, &objective),
            Err(OptError::ObjectiveEvaluation(_))
        ));
    }
}
