//! Adam loop.

use super::config::AdamConfig;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use log::debug;

/// Executes Adam.
pub struct AdamRunner;

impl AdamRunner {
    pub const NAME: &'static str = "adam";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = AdamConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &AdamConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut x = ctx.current_parameters().to_vec();
        let mut m = vec![0.0; x.len()];
        let mut v = vec![0.0; x.len()];

        for i in 0..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(x, TerminationReason::Cancelled);
            }

            let (loss, grad) = objective.loss_and_gradient(&x)?;
            if !loss.is_finite() || !linalg::all_finite(&grad) {
                debug!("adam diverged at iteration {i}");
                let last = ctx.last_logged_parameters();
                return ctx.complete(last, TerminationReason::Diverged);
            }

            // moments as they stood before this update
            let extra = [("m_norm", linalg::norm(&m)), ("v_norm", linalg::norm(&v))];
            ctx.log_step(i, loss, &x, Some(&grad), &extra)?;
            if ctx.loss_delta_below(config.tolerance) {
                return ctx.complete(x, TerminationReason::Converged);
            }

            let t = (i + 1) as i32;
            let m_correction = 1.0 - config.beta1.powi(t);
            let v_correction = 1.0 - config.beta2.powi(t);
            for k in 0..x.len() {
                m[k] = config.beta1 * m[k] + (1.0 - config.beta1) * grad[k];
                v[k] = config.beta2 * v[k] + (1.0 - config.beta2) * grad[k] * grad[k];
                let m_hat = m[k] / m_correction;
                let v_hat = v[k] / v_correction;
                x[k] -= config.learning_rate * m_hat / (v_hat.sqrt() + config.epsilon);
            }
        }

        ctx.complete(x, TerminationReason::MaxIterations)
    }
}
