//! Conjugate gradient loop.

use super::config::CgConfig;
use crate::context::{RunContext, RunResult, TerminationReason};
use crate::error::{OptError, OptResult};
use crate::line_search;
use crate::linalg;
use crate::objective::ObjectiveAdapter;
use log::debug;

/// Executes nonlinear conjugate gradient.
pub struct CgRunner;

impl CgRunner {
    pub const NAME: &'static str = "nonlinear_cg";

    pub fn run(ctx: &mut RunContext, objective: &ObjectiveAdapter) -> OptResult<RunResult> {
        let config = CgConfig::from_options(ctx.config());
        Self::run_with_config(ctx, objective, &config)
    }

    pub fn run_with_config(
        ctx: &mut RunContext,
        objective: &ObjectiveAdapter,
        config: &CgConfig,
    ) -> OptResult<RunResult> {
        config.validate().map_err(OptError::InvalidConfig)?;
        ctx.start(Self::NAME)?;

        let mut x = ctx.current_parameters().to_vec();
        let mut previous: Option<(Vec<f64>, Vec<f64>)> = None; // (g_old, d)

        for i in 0..config.max_iterations {
            if ctx.should_stop() {
                return ctx.complete(x, TerminationReason::Cancelled);
            }

            let (f, g) = objective.loss_and_gradient(&x)?;
            if !f.is_finite() || !linalg::all_finite(&g) {
                debug!("nonlinear_cg diverged at iteration {i}");
                let last = ctx.last_logged_parameters();
                return ctx.complete(last, TerminationReason::Diverged);
            }

            ctx.log_step(i, f, &x, Some(&g), &[])?;
            if linalg::norm(&g) < config.tolerance {
                return ctx.complete(x, TerminationReason::Converged);
            }

            let d = match previous.take() {
                None => negate(&g),
                Some((g_old, d_old)) => {
                    let d = polak_ribiere(&g, &g_old, &d_old);
                    if linalg::dot(&g, &d) >= 0.0 {
                        debug!("nonlinear_cg: restarting along -g at iteration {i}");
                        negate(&g)
                    } else {
                        d
                    }
                }
            };

            let slope = linalg::dot(&g, &d);
            let step = line_search::backtracking(objective, &x, f, slope, &d)?;
            if (step.loss - f).abs() < config.tolerance {
                // the accepted point is the last logged step when the budget allows
                if i + 1 < config.max_iterations {
                    let (f_new, g_new) = objective.loss_and_gradient(&step.point)?;
                    let gradient = linalg::all_finite(&g_new).then_some(g_new.as_slice());
                    ctx.log_step(i + 1, f_new, &step.point, gradient, &[])?;
                }
                return ctx.complete(step.point, TerminationReason::SmallImprovement);
            }

            previous = Some((g, d));
            x = step.point;
        }

        ctx.complete(x, TerminationReason::MaxIterations)
    }
}

fn negate(v: &[f64]) -> Vec<f64> {
    v.iter().map(|x| -x).collect()
}

/// `-g + β·d` with `β = max(0, gᵀ(g - g_old) / ‖g_old‖²)`; `β = 0` when
/// `g_old` vanishes.
fn polak_ribiere(g: &[f64], g_old: &[f64], d: &[f64]) -> Vec<f64> {
    let denom = linalg::dot(g_old, g_old);
    let beta = if denom == 0.0 {
        0.0
    } else {
        (linalg::dot(g, &linalg::sub(g, g_old)) / denom).max(0.0)
    };
    g.iter().zip(d).map(|(gi, di)| -gi + beta * di).collect()
}
